// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! A backend produces frames into a [`FrameSink`] from its own capture
//! thread. Consumers read them from the matching [`FrameStream`], which
//! only ever holds the most recent undelivered frame.
//!
//! Two backends exist:
//! - [`V4l2Camera`]: a Linux video device opened through V4L2
//! - [`ImageSequenceCamera`]: still images replayed at a fixed rate

pub mod file_source;
pub mod frame_loop;
pub mod types;
pub mod v4l2;

pub use file_source::ImageSequenceCamera;
pub use types::{
    BackendError, BackendResult, CameraDevice, CameraFrame, FrameSink, FrameStream, PixelFormat,
    Rotation, frame_channel,
};
pub use v4l2::{V4l2Camera, enumerate_cameras};

/// Frame source with a start/stop lifecycle and a torch control
pub trait CameraBackend: Send {
    /// Human-readable name for logs and the status bar
    fn name(&self) -> &str;

    /// Start producing frames into `sink`
    ///
    /// Errors such as a missing device or refused permission are returned
    /// here, before any frame is produced.
    fn start(&mut self, sink: FrameSink) -> BackendResult<()>;

    /// Stop producing frames and release the device
    ///
    /// Dropping the sink held by the capture thread ends every stream.
    fn stop(&mut self);

    /// Whether the capture thread is still producing frames
    fn is_running(&self) -> bool;

    /// Switch the torch on or off
    fn set_torch(&mut self, enabled: bool) -> BackendResult<()>;
}
