// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Pixel layout of a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    /// Common raw format from webcam sensors
    YUYV,
}

impl PixelFormat {
    /// Minimum bytes per pixel row for a given width
    pub fn min_stride(&self, width: u32) -> u32 {
        match self {
            PixelFormat::RGBA => width * 4,
            PixelFormat::RGB24 => width * 3,
            PixelFormat::Gray8 => width,
            PixelFormat::YUYV => width * 2,
        }
    }
}

/// Clockwise rotation needed to display a frame upright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Map a rotation in degrees onto the nearest quarter turn
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            45..=134 => Rotation::Deg90,
            135..=224 => Rotation::Deg180,
            225..=314 => Rotation::Deg270,
            _ => Rotation::Deg0,
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Whether width and height swap after applying this rotation
    pub fn swaps_axes(&self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Map a pixel of the upright image back to a `src_w` x `src_h` capture
    pub fn to_source(&self, x: u32, y: u32, src_w: u32, src_h: u32) -> (u32, u32) {
        match self {
            Rotation::Deg0 => (x, y),
            Rotation::Deg90 => (y, src_h - 1 - x),
            Rotation::Deg180 => (src_w - 1 - x, src_h - 1 - y),
            Rotation::Deg270 => (src_w - 1 - y, x),
        }
    }
}

/// A single captured frame
///
/// Pixel data is shared, so cloning a frame is cheap. The buffer is
/// released when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Pixel data laid out according to `format`
    pub data: Arc<[u8]>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride (bytes per row, may include padding)
    pub stride: u32,
    /// Rotation needed to show the frame upright
    pub rotation: Rotation,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Create a frame with a tightly packed stride and no rotation
    pub fn new(width: u32, height: u32, format: PixelFormat, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
            format,
            stride: format.min_stride(width),
            rotation: Rotation::Deg0,
            captured_at: Instant::now(),
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Check that the buffer is large enough for the declared geometry
    pub fn is_well_formed(&self) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        if self.stride < self.format.min_stride(self.width) {
            return false;
        }
        let needed = (self.height as usize - 1) * self.stride as usize
            + self.format.min_stride(self.width) as usize;
        self.data.len() >= needed
    }

    /// Width and height once the rotation is applied
    pub fn upright_dimensions(&self) -> (u32, u32) {
        if self.rotation.swaps_axes() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Sample the RGB value at a position of the upright image
    pub fn upright_rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let (w, h) = self.upright_dimensions();
        let (sx, sy) = self
            .rotation
            .to_source(x.min(w - 1), y.min(h - 1), self.width, self.height);
        self.rgb_at(sx, sy)
    }

    /// Sample the RGB value at a pixel position (clamped to the frame)
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let data = &self.data;
        let row = (y * self.stride) as usize;

        match self.format {
            PixelFormat::RGBA => {
                let idx = row + (x * 4) as usize;
                match data.get(idx..idx + 3) {
                    Some(px) => (px[0], px[1], px[2]),
                    None => (0, 0, 0),
                }
            }
            PixelFormat::RGB24 => {
                let idx = row + (x * 3) as usize;
                match data.get(idx..idx + 3) {
                    Some(px) => (px[0], px[1], px[2]),
                    None => (0, 0, 0),
                }
            }
            PixelFormat::Gray8 => {
                let v = data.get(row + x as usize).copied().unwrap_or(0);
                (v, v, v)
            }
            PixelFormat::YUYV => {
                // Two pixels share chroma: Y0 U Y1 V
                let base = row + ((x & !1) * 2) as usize;
                let Some(pair) = data.get(base..base + 4) else {
                    return (0, 0, 0);
                };
                let luma = if x & 1 == 0 { pair[0] } else { pair[2] };
                yuv_to_rgb(luma, pair[1], pair[3])
            }
        }
    }

    /// Sample the luma (brightness) at a pixel position (clamped to the frame)
    pub fn luma_at(&self, x: u32, y: u32) -> u8 {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let row = (y * self.stride) as usize;

        match self.format {
            PixelFormat::Gray8 => self.data.get(row + x as usize).copied().unwrap_or(0),
            PixelFormat::YUYV => self.data.get(row + (x * 2) as usize).copied().unwrap_or(0),
            PixelFormat::RGBA | PixelFormat::RGB24 => {
                let (r, g, b) = self.rgb_at(x, y);
                // BT.601 integer approximation
                ((r as u32 * 77 + g as u32 * 150 + b as u32 * 29) >> 8) as u8
            }
        }
    }
}

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

/// Camera device discovered on the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    pub path: String,
}

/// Producer side of the keep-latest frame slot
///
/// Publishing replaces any frame that has not been picked up yet, so a
/// slow consumer only ever sees the most recent frame.
#[derive(Debug, Clone)]
pub struct FrameSink {
    sender: Arc<watch::Sender<Option<CameraFrame>>>,
}

/// Consumer side of the keep-latest frame slot
#[derive(Debug, Clone)]
pub struct FrameStream {
    receiver: watch::Receiver<Option<CameraFrame>>,
}

/// Create a connected keep-latest frame slot
pub fn frame_channel() -> (FrameSink, FrameStream) {
    let (sender, receiver) = watch::channel(None);
    (
        FrameSink {
            sender: Arc::new(sender),
        },
        FrameStream { receiver },
    )
}

impl FrameSink {
    /// Publish a frame, replacing any undelivered one
    pub fn publish(&self, frame: CameraFrame) {
        // send_replace succeeds even when every stream has been dropped
        let _ = self.sender.send_replace(Some(frame));
    }

    /// Whether any stream is still listening
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Open another stream on this slot
    pub fn subscribe(&self) -> FrameStream {
        FrameStream {
            receiver: self.sender.subscribe(),
        }
    }
}

impl FrameStream {
    /// Wait for a frame newer than the last one taken
    ///
    /// Returns `None` once every sink has been dropped, which means the
    /// capture pipeline has stopped.
    pub async fn next_frame(&mut self) -> Option<CameraFrame> {
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(frame) = self.receiver.borrow_and_update().clone() {
                return Some(frame);
            }
        }
    }

    /// Take the newest frame if one arrived since the last call (non-blocking)
    pub fn try_latest(&mut self) -> Option<CameraFrame> {
        match self.receiver.has_changed() {
            Ok(true) => self.receiver.borrow_and_update().clone(),
            _ => None,
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// The device exists but cannot be opened by this user
    PermissionDenied(String),
    /// Failed to initialize backend
    InitializationFailed(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Format not supported
    FormatNotSupported(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl BackendError {
    /// Classify an I/O error raised while opening `path`
    pub fn from_open_error(path: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                BackendError::PermissionDenied(format!("{}: {}", path, err))
            }
            std::io::ErrorKind::NotFound => BackendError::DeviceNotFound(path.to_string()),
            _ => BackendError::IoError(format!("{}: {}", path, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(0), Rotation::Deg0);
        assert_eq!(Rotation::from_degrees(90), Rotation::Deg90);
        assert_eq!(Rotation::from_degrees(-90), Rotation::Deg270);
        assert_eq!(Rotation::from_degrees(540), Rotation::Deg180);
        assert!(Rotation::Deg270.swaps_axes());
        assert!(!Rotation::Deg180.swaps_axes());
    }

    #[test]
    fn test_yuyv_sampling() {
        // Two pixels, Y0=16, Y1=235, neutral chroma
        let frame = CameraFrame::new(2, 1, PixelFormat::YUYV, vec![16u8, 128, 235, 128]);
        assert_eq!(frame.luma_at(0, 0), 16);
        assert_eq!(frame.luma_at(1, 0), 235);
        assert_eq!(frame.rgb_at(1, 0), (235, 235, 235));
    }

    #[test]
    fn test_well_formed_with_stride_padding() {
        let frame = CameraFrame {
            stride: 10,
            ..CameraFrame::new(2, 2, PixelFormat::RGBA, vec![0u8; 18])
        };
        assert!(frame.is_well_formed());

        let short = CameraFrame::new(2, 2, PixelFormat::RGBA, vec![0u8; 15]);
        assert!(!short.is_well_formed());
    }

    #[test]
    fn test_open_error_classification() {
        let err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(
            BackendError::from_open_error("/dev/video0", err),
            BackendError::PermissionDenied(_)
        ));
    }

    #[tokio::test]
    async fn test_frame_slot_keeps_only_latest() {
        let (sink, mut stream) = frame_channel();
        sink.publish(CameraFrame::new(1, 1, PixelFormat::Gray8, vec![1u8]));
        sink.publish(CameraFrame::new(1, 1, PixelFormat::Gray8, vec![2u8]));

        let frame = stream.next_frame().await.unwrap();
        assert_eq!(frame.data[0], 2);
        assert!(stream.try_latest().is_none());

        drop(sink);
        assert!(stream.next_frame().await.is_none());
    }
}
