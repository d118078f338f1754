// SPDX-License-Identifier: GPL-3.0-only

//! Terminal scanning screen
//!
//! Renders the camera feed to the terminal using Unicode half-block
//! characters, with the latest scan result on a line below it.

use crate::backends::camera::{CameraBackend, CameraFrame, frame_channel};
use crate::clipboard::SystemClipboard;
use crate::config::Config;
use crate::constants::ui;
use crate::errors::CameraError;
use crate::scanner::{DisplayState, ScanSession};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use std::io::{self, stdout};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::info;

/// Run the terminal scanning screen until the user quits
pub fn run(camera: Box<dyn CameraBackend>, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::new()?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &runtime, camera, config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    runtime: &Runtime,
    mut camera: Box<dyn CameraBackend>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let (session, mut events) = ScanSession::from_config(config);
    let mut display = DisplayState::new(config.toast_duration());
    let mut frame_widget = FrameWidget::new();

    let (sink, analysis_stream) = frame_channel();
    let mut preview = sink.subscribe();
    match camera.start(sink) {
        Ok(()) => {
            info!(camera = camera.name(), session = %session.id(), "Scanning started");
            let _guard = runtime.enter();
            session.spawn_analyzer(analysis_stream);
        }
        Err(e) => session.report_camera_error(&CameraError::from(e)),
    }

    let mut show_help = false;

    loop {
        let now = Instant::now();
        while let Ok(event) = events.try_recv() {
            display.apply(event, now);
        }
        if let Some(frame) = preview.try_latest() {
            frame_widget.update_frame(frame);
        }

        let status_message = if show_help {
            build_help_message()
        } else {
            build_status_message(&display, session.identifiers().len(), camera.name())
        };
        let toast = display.toast(now);
        let result_line = ResultLine {
            text: toast.unwrap_or(display.label()),
            highlighted: toast.is_some(),
        };

        terminal.draw(|f| {
            let area = f.area();

            // Reserve the bottom two lines for the result and the status bar
            let camera_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(2),
            };
            let result_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(2),
                width: area.width,
                height: 1,
            };
            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };

            f.render_widget(&frame_widget, camera_area);
            f.render_widget(result_line, result_area);
            f.render_widget(
                StatusBar {
                    message: &status_message,
                },
                status_area,
            );
        })?;

        if event::poll(ui::POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
            match key.code {
                KeyCode::Char('c') if ctrl => break,
                KeyCode::Char('q') => break,
                KeyCode::Char('c') => {
                    session.copy_identifiers(&SystemClipboard);
                }
                KeyCode::Char('t') => {
                    session.toggle_torch(camera.as_mut());
                }
                KeyCode::Char('h') => show_help = !show_help,
                _ => {}
            }
        }
    }

    camera.stop();
    info!(
        identifiers = session.identifiers().len(),
        admitted = session.gate().admitted_count(),
        dropped = session.gate().dropped_count(),
        "Scanning finished"
    );
    Ok(())
}

fn build_status_message(display: &DisplayState, identifiers: usize, camera: &str) -> String {
    let torch = if display.torch() { "on" } else { "off" };
    let mut msg = format!("{} | {} IDs | torch {}", camera, identifiers, torch);
    if let Some(link) = display.last_link() {
        msg.push_str(" | opened ");
        msg.push_str(link);
    }
    msg.push_str(" | 'h' help | 'q' quit");
    msg
}

fn build_help_message() -> String {
    String::from("t: Toggle torch | c: Copy unique IDs | h: Toggle help | q/Ctrl+C: Quit")
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget {
    frame: Option<CameraFrame>,
}

impl FrameWidget {
    fn new() -> Self {
        Self { frame: None }
    }

    fn update_frame(&mut self, frame: CameraFrame) {
        self.frame = Some(frame);
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let frame = match &self.frame {
            Some(frame) if frame.width > 0 && frame.height > 0 => frame,
            _ => {
                let msg = "Waiting for camera...";
                let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
                let y = area.y + area.height / 2;
                if y < area.y + area.height && x < area.x + area.width {
                    buf.set_string(x, y, msg, Style::default());
                }
                return;
            }
        };

        // Each terminal cell displays 2 vertical pixels
        let (frame_w, frame_h) = frame.upright_dimensions();
        let frame_aspect = frame_w as f64 / frame_h as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame_w as f64 / display_width as f64;
        let y_scale = frame_h as f64 / (display_height * 2) as f64;

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (r, g, b) = frame.upright_rgb_at(src_x, src_y_top);
                let top_color = Color::Rgb(r, g, b);
                let (r, g, b) = frame.upright_rgb_at(src_x, src_y_bottom);
                let bottom_color = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top_color);
                    cell.set_bg(bottom_color);
                }
            }
        }
    }
}

/// The latest result, or a toast covering it
struct ResultLine<'a> {
    text: &'a str,
    highlighted: bool,
}

impl Widget for ResultLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = if self.highlighted {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        };

        let text: String = self.text.chars().take(area.width as usize).collect();
        let len = text.chars().count() as u16;
        let x = area.x + area.width.saturating_sub(len) / 2;
        buf.set_string(x, area.y, text, style);
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
