// SPDX-License-Identifier: GPL-3.0-only

//! Decoder implementations

pub mod qr_detector;

pub use qr_detector::QrDetector;
