// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera backend
//!
//! Opens a `/dev/video*` node, negotiates a capture format, and streams
//! memory-mapped buffers into the frame slot. YUYV and GREY buffers are
//! passed through as-is; MJPG buffers are decoded to RGBA.

use super::CameraBackend;
use super::frame_loop::{CaptureLoop, LoopAction};
use super::types::{
    BackendError, BackendResult, CameraDevice, CameraFrame, FrameSink, PixelFormat, Rotation,
};
use crate::constants::capture;
use crate::flash::TorchDevice;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

/// List V4L2 capture devices present on the system
pub fn enumerate_cameras() -> Vec<CameraDevice> {
    v4l::context::enum_devices()
        .into_iter()
        .map(|node| {
            let path = node.path().display().to_string();
            let name = node.name().unwrap_or_else(|| path.clone());
            CameraDevice { name, path }
        })
        .collect()
}

/// Pixel layout negotiated with the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireFormat {
    Yuyv,
    Grey,
    Mjpg,
}

impl WireFormat {
    fn from_fourcc(fourcc: &v4l::FourCC) -> Option<Self> {
        match &fourcc.repr {
            b"YUYV" => Some(WireFormat::Yuyv),
            b"GREY" => Some(WireFormat::Grey),
            b"MJPG" => Some(WireFormat::Mjpg),
            _ => None,
        }
    }
}

/// Negotiated capture geometry
#[derive(Debug, Clone, Copy)]
struct Negotiated {
    width: u32,
    height: u32,
    stride: u32,
    wire: WireFormat,
}

/// Camera backed by a V4L2 device node
pub struct V4l2Camera {
    device_path: String,
    width: u32,
    height: u32,
    rotation: Rotation,
    torch_led: Option<String>,
    torch: Option<TorchDevice>,
    capture: Option<CaptureLoop>,
}

impl V4l2Camera {
    pub fn new(device_path: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            device_path: device_path.into(),
            width,
            height,
            rotation: Rotation::Deg0,
            torch_led: None,
            torch: None,
            capture: None,
        }
    }

    /// Tag every frame with a mounting rotation
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Use a specific sysfs LED for the torch instead of auto-discovery
    pub fn with_torch_led(mut self, led: Option<String>) -> Self {
        self.torch_led = led;
        self
    }
}

impl CameraBackend for V4l2Camera {
    fn name(&self) -> &str {
        &self.device_path
    }

    fn start(&mut self, sink: FrameSink) -> BackendResult<()> {
        self.stop();

        let path = self.device_path.clone();
        let (width, height, rotation) = (self.width, self.height, self.rotation);

        let init_path = path.clone();
        let init = move || -> BackendResult<(MmapStream<'static>, Negotiated)> {
            let dev = Device::with_path(&init_path)
                .map_err(|e| BackendError::from_open_error(&init_path, e))?;
            let negotiated = negotiate_format(&dev, width, height)?;
            let stream =
                MmapStream::with_buffers(&dev, Type::VideoCapture, capture::V4L2_BUFFER_COUNT)
                    .map_err(|e| {
                        BackendError::InitializationFailed(format!(
                            "Failed to create buffer stream: {}",
                            e
                        ))
                    })?;
            Ok((stream, negotiated))
        };

        let frame_counter = AtomicU64::new(0);
        let body = move |(stream, negotiated): &mut (MmapStream<'static>, Negotiated)| {
            if !sink.is_connected() {
                debug!("No frame consumers left, stopping capture");
                return LoopAction::Stop;
            }

            match stream.next() {
                Ok((buf, meta)) => {
                    let frame_num = frame_counter.fetch_add(1, Ordering::Relaxed);
                    match buffer_to_frame(buf, negotiated) {
                        Some(frame) => {
                            if frame_num % 60 == 0 {
                                debug!(
                                    frame = frame_num,
                                    sequence = meta.sequence,
                                    size = buf.len(),
                                    "Frame captured"
                                );
                            }
                            sink.publish(frame.with_rotation(rotation));
                        }
                        None => {
                            if frame_num % 30 == 0 {
                                warn!(frame = frame_num, size = buf.len(), "Dropping malformed buffer");
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to dequeue frame");
                    std::thread::sleep(capture::RETRY_DELAY);
                }
            }
            LoopAction::Continue
        };

        let capture = CaptureLoop::spawn("v4l2-capture", init, body)?;
        info!(device = %path, "V4L2 capture started");
        self.capture = Some(capture);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            capture.stop();
            info!(device = %self.device_path, "V4L2 capture stopped");
        }
        if let Some(torch) = self.torch.take() {
            let _ = torch.set_enabled(false);
        }
    }

    fn is_running(&self) -> bool {
        self.capture.as_ref().is_some_and(|c| c.is_running())
    }

    fn set_torch(&mut self, enabled: bool) -> BackendResult<()> {
        if self.torch.is_none() {
            let device = TorchDevice::discover(self.torch_led.as_deref())
                .map_err(|e| BackendError::NotAvailable(format!("torch: {}", e)))?;
            self.torch = Some(device);
        }
        if let Some(torch) = &self.torch {
            torch
                .set_enabled(enabled)
                .map_err(|e| BackendError::IoError(format!("{}: {}", torch.name(), e)))?;
        }
        Ok(())
    }
}

impl Drop for V4l2Camera {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ask for YUYV at the requested size and accept whatever usable format comes back
fn negotiate_format(dev: &Device, width: u32, height: u32) -> BackendResult<Negotiated> {
    let mut format = dev
        .format()
        .map_err(|e| BackendError::InitializationFailed(format!("Failed to query format: {}", e)))?;
    format.width = width;
    format.height = height;
    format.fourcc = v4l::FourCC::new(b"YUYV");

    let applied = match dev.set_format(&format) {
        Ok(f) => f,
        Err(e) => {
            warn!(error = %e, "Could not set format, using current device format");
            dev.format().map_err(|e| {
                BackendError::InitializationFailed(format!("Failed to query format: {}", e))
            })?
        }
    };

    let wire = WireFormat::from_fourcc(&applied.fourcc)
        .ok_or_else(|| BackendError::FormatNotSupported(applied.fourcc.to_string()))?;

    info!(
        width = applied.width,
        height = applied.height,
        fourcc = %applied.fourcc,
        "Negotiated V4L2 format"
    );

    Ok(Negotiated {
        width: applied.width,
        height: applied.height,
        stride: applied.stride,
        wire,
    })
}

fn buffer_to_frame(buf: &[u8], negotiated: &Negotiated) -> Option<CameraFrame> {
    let captured_at = Instant::now();
    let frame = match negotiated.wire {
        WireFormat::Yuyv | WireFormat::Grey => {
            let format = if negotiated.wire == WireFormat::Yuyv {
                PixelFormat::YUYV
            } else {
                PixelFormat::Gray8
            };
            CameraFrame {
                width: negotiated.width,
                height: negotiated.height,
                data: Arc::from(buf),
                format,
                // Some drivers report 0 for packed formats
                stride: negotiated
                    .stride
                    .max(format.min_stride(negotiated.width)),
                rotation: Rotation::Deg0,
                captured_at,
            }
        }
        WireFormat::Mjpg => {
            let img = image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg)
                .map_err(|e| debug!(error = %e, "Failed to decode MJPG buffer"))
                .ok()?
                .to_rgba8();
            let (width, height) = img.dimensions();
            CameraFrame {
                captured_at,
                ..CameraFrame::new(width, height, PixelFormat::RGBA, img.into_raw())
            }
        }
    };

    frame.is_well_formed().then_some(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_buffer_passthrough() {
        let negotiated = Negotiated {
            width: 2,
            height: 2,
            stride: 0,
            wire: WireFormat::Yuyv,
        };
        let frame = buffer_to_frame(&[16, 128, 235, 128, 16, 128, 235, 128], &negotiated).unwrap();
        assert_eq!(frame.format, PixelFormat::YUYV);
        assert_eq!(frame.stride, 4);
        assert_eq!(frame.luma_at(1, 1), 235);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let negotiated = Negotiated {
            width: 4,
            height: 4,
            stride: 4,
            wire: WireFormat::Grey,
        };
        assert!(buffer_to_frame(&[0u8; 8], &negotiated).is_none());
    }

    #[test]
    fn test_wire_format_from_fourcc() {
        assert_eq!(
            WireFormat::from_fourcc(&v4l::FourCC::new(b"MJPG")),
            Some(WireFormat::Mjpg)
        );
        assert_eq!(WireFormat::from_fourcc(&v4l::FourCC::new(b"NV12")), None);
    }

    #[test]
    fn test_missing_device_fails_on_start() {
        let mut camera = V4l2Camera::new("/dev/scanlink-missing-video", 640, 480);
        let (sink, _stream) = super::super::types::frame_channel();
        let err = camera.start(sink).unwrap_err();
        assert!(matches!(err, BackendError::DeviceNotFound(_)));
        assert!(!camera.is_running());
    }
}
