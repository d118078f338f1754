// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for scanning without the terminal screen
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Scanning headless from a camera or image sequence
//! - Decoding barcodes in image files
//! - Showing a web page
//! - Inspecting the configuration

use scanlink::Config;
use scanlink::backends::camera::file_source::load_image_as_frame;
use scanlink::backends::camera::{
    CameraBackend, ImageSequenceCamera, Rotation, V4l2Camera, enumerate_cameras, frame_channel,
};
use scanlink::clipboard::SystemClipboard;
use scanlink::errors::CameraError;
use scanlink::scanner::{GateState, ScanEvent, ScanSession, Submission, SystemBrowser};
use scanlink::web::WebScreen;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::warn;

/// Image extensions accepted by `decode` and `scan --images`
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp"];

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Device: {}", camera.path);
        println!();
    }

    Ok(())
}

/// Build the frame source: replayed images when given, the configured device otherwise
pub fn open_camera(
    config: &Config,
    images: &[PathBuf],
    fps: u32,
    looping: bool,
) -> Result<Box<dyn CameraBackend>, Box<dyn std::error::Error>> {
    if images.is_empty() {
        let camera = V4l2Camera::new(
            config.camera_device.clone(),
            config.capture_width,
            config.capture_height,
        )
        .with_rotation(Rotation::from_degrees(config.camera_rotation))
        .with_torch_led(config.torch_led.clone());
        return Ok(Box::new(camera));
    }

    let paths = collect_image_paths(images)?;
    if paths.is_empty() {
        return Err("No supported images found".into());
    }
    let camera = ImageSequenceCamera::open(&paths, fps)?.looping(looping);
    Ok(Box::new(camera))
}

/// Scan without a screen, printing identifiers to stdout until Ctrl+C
///
/// An image sequence that does not loop ends the scan by itself.
pub fn scan_headless(
    mut camera: Box<dyn CameraBackend>,
    config: &Config,
    copy: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let (session, mut events) = ScanSession::from_config(config);

    let (sink, stream) = frame_channel();
    if let Err(e) = camera.start(sink) {
        let err = CameraError::from(e);
        session.report_camera_error(&err);
        while let Ok(event) = events.try_recv() {
            print_event(&event);
        }
        return Err(err.into());
    }

    eprintln!("Scanning with {} (press Ctrl+C to stop)", camera.name());

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    runtime.block_on(async {
        let analyzer = session.spawn_analyzer(stream);
        loop {
            if stop_flag.load(Ordering::SeqCst) {
                eprintln!();
                eprintln!("Stopping...");
                break;
            }

            match tokio::time::timeout(Duration::from_millis(100), events.recv()).await {
                Ok(Some(event)) => print_event(&event),
                Ok(None) => break,
                Err(_) => {
                    if analyzer.is_finished() && session.gate().state() == GateState::Idle {
                        while let Ok(event) = events.try_recv() {
                            print_event(&event);
                        }
                        break;
                    }
                }
            }
        }
    });

    camera.stop();
    finish(&session, copy);
    Ok(())
}

/// Decode the barcodes in image files (or directories of images)
pub fn decode_images(
    input: &[PathBuf],
    config: &Config,
    copy: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let paths = collect_image_paths(input)?;
    if paths.is_empty() {
        return Err("No supported images found".into());
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let (session, mut events) = ScanSession::from_config(config);

    runtime.block_on(async {
        for path in &paths {
            let frame = match load_image_as_frame(path) {
                Ok(frame) => frame,
                Err(e) => {
                    eprintln!("{}: {}", path.display(), e);
                    continue;
                }
            };

            // Images are decoded one after another, so the gate is always free
            if let Submission::Admitted(handle) = session.submit(frame)
                && let Err(e) = handle.await
            {
                warn!(path = %path.display(), error = %e, "Decode task failed");
            }

            let mut found = false;
            while let Ok(event) = events.try_recv() {
                found = true;
                print_event(&event);
            }
            if !found {
                eprintln!("{}: no barcode found", path.display());
            }
        }
    });

    finish(&session, copy);
    Ok(())
}

/// Show a web page in the system viewer
pub fn show_web_page(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    WebScreen::new(url).show(&SystemBrowser)?;
    println!("Opened {}", url);
    Ok(())
}

/// Print the effective configuration, optionally writing defaults first
pub fn show_config(path: Option<&Path>, init: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path().ok_or("No config directory on this system")?,
    };

    if init {
        if path.exists() {
            eprintln!("Config already exists: {}", path.display());
        } else {
            Config::default().save_to(&path)?;
            eprintln!("Wrote default config: {}", path.display());
        }
    }

    let config = Config::load_from(&path)?;
    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn finish(session: &ScanSession, copy: bool) {
    if copy {
        eprintln!("{}", session.copy_identifiers(&SystemClipboard).text());
    }
    eprintln!("{} unique identifiers", session.identifiers().len());
}

fn print_event(event: &ScanEvent) {
    match event {
        ScanEvent::IdentifierScanned(id) => println!("{}", id),
        ScanEvent::LinkOpened(url) => eprintln!("Opened {}", url),
        ScanEvent::Notice(notice) => eprintln!("{}", notice.text()),
        ScanEvent::TorchChanged(enabled) => {
            eprintln!("Torch {}", if *enabled { "on" } else { "off" })
        }
    }
}

/// Collect all image paths from input (files or directories)
fn collect_image_paths(input: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();

    for path in input {
        if path.is_dir() {
            let mut entries = Vec::new();
            for entry in std::fs::read_dir(path)? {
                let file_path = entry?.path();
                if is_supported_image(&file_path) {
                    entries.push(file_path);
                }
            }
            // Sort by filename for consistent ordering
            entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
            paths.extend(entries);
        } else {
            // Explicit files are kept as given; loading reports unreadable ones
            paths.push(path.clone());
        }
    }

    Ok(paths)
}

/// Check if a path is a supported image file
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}
