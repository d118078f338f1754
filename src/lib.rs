// SPDX-License-Identifier: GPL-3.0-only

//! scanlink - a barcode scanner that opens links and collects identifiers
//!
//! Camera frames are decoded one at a time. Values starting with `http`
//! are opened in the browser; everything else is kept in a set of unique
//! identifiers that can be copied to the clipboard.
//!
//! # Architecture
//!
//! - [`backends`]: Camera capture (V4L2 devices and image sequences)
//! - [`scanner`]: Scan gate, decoder, result routing and the scan session
//! - [`terminal`]: Interactive scanning screen rendered in the terminal
//! - [`web`]: Single-page web display
//! - [`config`]: User configuration handling

pub mod backends;
pub mod clipboard;
pub mod config;
pub mod constants;
pub mod errors;
pub mod flash;
pub mod scanner;
pub mod terminal;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use scanner::{DisplayState, Notice, ScanEvent, ScanGate, ScanSession};
