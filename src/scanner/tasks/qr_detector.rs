// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! This module implements QR code detection using the rqrr crate.
//! Camera frames are reduced to an upright luma plane, optionally
//! downscaled, and searched for QR symbols.

use crate::backends::camera::types::CameraFrame;
use crate::constants::decoding;
use crate::errors::ScanError;
use crate::scanner::Decoder;
use crate::scanner::types::{DecodeResult, DecodedValue};
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, trace, warn};

/// QR code detector
///
/// Optimized for real-time processing with frame downscaling.
#[derive(Debug, Clone, Copy)]
pub struct QrDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    /// Create a new QR detector with default settings
    pub fn new() -> Self {
        Self {
            max_dimension: decoding::DEFAULT_MAX_DIMENSION,
        }
    }

    /// Create a QR detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(decoding::MIN_MAX_DIMENSION),
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }
}

impl Decoder for QrDetector {
    /// Runs detection on the blocking pool to keep the async runtime free
    fn decode(&self, frame: CameraFrame) -> BoxFuture<'static, DecodeResult> {
        let max_dim = self.max_dimension;
        async move {
            tokio::task::spawn_blocking(move || detect_sync(&frame, max_dim))
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "QR detection task panicked");
                    Err(ScanError::DecoderAborted(e.to_string()))
                })
        }
        .boxed()
    }
}

/// Synchronous QR detection (runs in blocking task)
fn detect_sync(frame: &CameraFrame, max_dimension: u32) -> DecodeResult {
    let start = std::time::Instant::now();

    if !frame.is_well_formed() {
        return Err(ScanError::UnsupportedFrame(format!(
            "{}x{} {:?} frame with stride {} and {} bytes",
            frame.width,
            frame.height,
            frame.format,
            frame.stride,
            frame.data.len()
        )));
    }

    let (luma, width, height) = luma_plane(frame, max_dimension);
    trace!(
        width,
        height,
        rotation = frame.rotation.degrees(),
        prepare_ms = start.elapsed().as_millis(),
        "Prepared luma plane"
    );

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| {
        luma[y * width + x]
    });
    let grids = prepared.detect_grids();

    let values: Vec<DecodedValue> = grids
        .iter()
        .map(|grid| match grid.decode() {
            // An empty payload is still a value
            Ok((_meta, content)) => {
                debug!(content = %content, "Detected QR code");
                Some(content)
            }
            Err(e) => {
                debug!(error = ?e, "Failed to decode QR code");
                None
            }
        })
        .collect();

    if !values.is_empty() {
        debug!(
            count = values.len(),
            total_ms = start.elapsed().as_millis(),
            "QR detection found codes"
        );
    }

    Ok(values)
}

/// Build an upright luma plane no larger than `max_dimension` on either side
///
/// Returns the plane with its width and height.
fn luma_plane(frame: &CameraFrame, max_dimension: u32) -> (Vec<u8>, usize, usize) {
    let (src_w, src_h) = (frame.width, frame.height);
    let (upright_w, upright_h) = frame.upright_dimensions();

    let scale = (upright_w as f32 / max_dimension as f32)
        .max(upright_h as f32 / max_dimension as f32)
        .max(1.0);
    let out_w = ((upright_w as f32 / scale) as u32).max(1);
    let out_h = ((upright_h as f32 / scale) as u32).max(1);

    let x_ratio = upright_w as f32 / out_w as f32;
    let y_ratio = upright_h as f32 / out_h as f32;

    let mut plane = Vec::with_capacity((out_w * out_h) as usize);

    for oy in 0..out_h {
        for ox in 0..out_w {
            let ux = ox as f32 * x_ratio;
            let uy = oy as f32 * y_ratio;

            if scale == 1.0 {
                let (sx, sy) = frame.rotation.to_source(ux as u32, uy as u32, src_w, src_h);
                plane.push(frame.luma_at(sx, sy));
                continue;
            }

            // Bilinear interpolation between the four neighbouring samples
            let x0 = ux as u32;
            let y0 = uy as u32;
            let x1 = (x0 + 1).min(upright_w - 1);
            let y1 = (y0 + 1).min(upright_h - 1);
            let x_frac = ux - x0 as f32;
            let y_frac = uy - y0 as f32;

            let sample = |x: u32, y: u32| -> f32 {
                let (sx, sy) = frame.rotation.to_source(x, y, src_w, src_h);
                frame.luma_at(sx, sy) as f32
            };

            let value = sample(x0, y0) * (1.0 - x_frac) * (1.0 - y_frac)
                + sample(x1, y0) * x_frac * (1.0 - y_frac)
                + sample(x0, y1) * (1.0 - x_frac) * y_frac
                + sample(x1, y1) * x_frac * y_frac;

            plane.push(value as u8);
        }
    }

    (plane, out_w as usize, out_h as usize)
}
