// SPDX-License-Identifier: GPL-3.0-only

//! Barcode scanning pipeline
//!
//! Frames from the camera pass through the [`ScanGate`], which admits one
//! decode at a time. Decoded values go to the [`ResultRouter`], and the
//! outcome reaches the presentation layer as [`ScanEvent`] messages sent
//! by the [`ScanSession`].

pub mod display;
pub mod gate;
pub mod links;
pub mod router;
pub mod session;
pub mod tasks;
pub mod types;

pub use display::DisplayState;
pub use gate::{GateState, ScanGate, Submission};
pub use links::{BrowserLauncher, LinkPolicy, SystemBrowser, parse_link};
pub use router::{IdentifierSet, ResultRouter};
pub use session::ScanSession;
pub use tasks::QrDetector;
pub use types::{DecodeResult, DecodedValue, Notice, NoticeStyle, ScanEvent};

use crate::backends::camera::CameraFrame;
use futures::future::BoxFuture;

/// Turns a frame into the values of the symbols it contains
///
/// The returned future owns the frame and drops it when decoding ends.
pub trait Decoder: Send + Sync {
    fn decode(&self, frame: CameraFrame) -> BoxFuture<'static, DecodeResult>;
}
