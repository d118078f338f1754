// SPDX-License-Identifier: GPL-3.0-only

//! Still images replayed as a camera
//!
//! Loads image files up front and publishes them one after another at a
//! fixed frame rate. Used for headless scanning of saved pictures and for
//! exercising the scanner without camera hardware.

use super::CameraBackend;
use super::frame_loop::{CaptureLoop, LoopAction};
use super::types::{BackendError, BackendResult, CameraFrame, FrameSink, PixelFormat};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Load an image file and convert it to a CameraFrame
///
/// Supports the formats enabled in the `image` crate (PNG, JPEG, GIF, BMP, WebP, ...)
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => BackendError::from_open_error(&path.display().to_string(), io),
        other => BackendError::FormatNotSupported(format!("'{}': {}", path.display(), other)),
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    debug!(path = %path.display(), width, height, "Image loaded");

    Ok(CameraFrame::new(width, height, PixelFormat::RGBA, rgba.into_raw()))
}

/// Camera that replays still images
pub struct ImageSequenceCamera {
    frames: Vec<CameraFrame>,
    interval: Duration,
    looping: bool,
    torch: bool,
    capture: Option<CaptureLoop>,
}

impl ImageSequenceCamera {
    /// Load every image in `paths`; fails on the first unreadable file
    pub fn open(paths: &[PathBuf], fps: u32) -> BackendResult<Self> {
        if paths.is_empty() {
            return Err(BackendError::DeviceNotFound("no images given".into()));
        }
        let frames = paths
            .iter()
            .map(|p| load_image_as_frame(p.as_path()))
            .collect::<BackendResult<Vec<_>>>()?;
        info!(count = frames.len(), fps, "Image sequence loaded");
        Ok(Self::from_frames(frames, fps))
    }

    /// Build a sequence from frames already in memory
    pub fn from_frames(frames: Vec<CameraFrame>, fps: u32) -> Self {
        Self {
            frames,
            interval: Duration::from_secs(1) / fps.max(1),
            looping: false,
            torch: false,
            capture: None,
        }
    }

    /// Restart from the first image after the last one instead of stopping
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Torch state as last set (there is no LED behind an image sequence)
    pub fn torch_enabled(&self) -> bool {
        self.torch
    }
}

impl CameraBackend for ImageSequenceCamera {
    fn name(&self) -> &str {
        "image sequence"
    }

    fn start(&mut self, sink: FrameSink) -> BackendResult<()> {
        self.stop();

        if self.frames.is_empty() {
            return Err(BackendError::DeviceNotFound("image sequence is empty".into()));
        }

        let frames = self.frames.clone();
        let interval = self.interval;
        let looping = self.looping;
        let mut index = 0usize;

        let body = move |next_due: &mut Instant| {
            let now = Instant::now();
            if now < *next_due {
                std::thread::sleep(*next_due - now);
            }
            *next_due += interval;

            if index >= frames.len() {
                if !looping {
                    debug!("Image sequence finished");
                    return LoopAction::Stop;
                }
                index = 0;
            }

            let frame = CameraFrame {
                captured_at: Instant::now(),
                ..frames[index].clone()
            };
            sink.publish(frame);
            index += 1;
            LoopAction::Continue
        };

        // The sink moves into the loop, streams end when it exits
        self.capture = Some(CaptureLoop::spawn(
            "image-sequence",
            || Ok(Instant::now()),
            body,
        )?);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            capture.stop();
        }
    }

    fn is_running(&self) -> bool {
        self.capture.as_ref().is_some_and(|c| c.is_running())
    }

    fn set_torch(&mut self, enabled: bool) -> BackendResult<()> {
        self.torch = enabled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::frame_channel;

    fn gray(value: u8) -> CameraFrame {
        CameraFrame::new(2, 2, PixelFormat::Gray8, vec![value; 4])
    }

    #[tokio::test]
    async fn test_sequence_plays_once_then_ends_stream() {
        let mut camera = ImageSequenceCamera::from_frames(vec![gray(1), gray(2)], 100);
        let (sink, mut stream) = frame_channel();
        camera.start(sink).unwrap();

        let mut seen = Vec::new();
        while let Some(frame) = stream.next_frame().await {
            seen.push(frame.data[0]);
        }

        // Keep-latest may skip a frame, but the last one always arrives
        assert_eq!(seen.last(), Some(&2));
        camera.stop();
        assert!(!camera.is_running());
    }

    #[test]
    fn test_missing_image_reports_not_found() {
        let result = ImageSequenceCamera::open(&[PathBuf::from("/nonexistent/code.png")], 5);
        assert!(matches!(result, Err(BackendError::DeviceNotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_sequence_does_not_start() {
        let mut camera = ImageSequenceCamera::from_frames(Vec::new(), 50).looping(true);
        let (sink, mut stream) = frame_channel();

        let result = camera.start(sink);
        assert!(matches!(result, Err(BackendError::DeviceNotFound(_))));
        assert!(!camera.is_running());
        // The sink was dropped, so the stream ends instead of waiting forever
        assert!(stream.next_frame().await.is_none());
    }

    #[test]
    fn test_torch_is_recorded() {
        let mut camera = ImageSequenceCamera::from_frames(vec![gray(0)], 5);
        camera.set_torch(true).unwrap();
        assert!(camera.torch_enabled());
    }
}
