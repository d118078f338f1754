// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application identifier used for config and cache directories
pub const APP_ID: &str = "scanlink";

/// Decoded values starting with this prefix are treated as links
pub const LINK_PREFIX: &str = "http";

/// Log file written under the cache directory while the terminal UI runs
pub const LOG_FILE_NAME: &str = "scanlink.log";

/// User-visible notice texts
pub mod notices {
    pub const NO_VALUE: &str = "No barcode value";
    pub const SCAN_FAILED: &str = "Scan failed";
    pub const INVALID_URL: &str = "Invalid URL";
    pub const PERMISSION_REQUIRED: &str = "Camera permission is required";
    pub const COPIED: &str = "Unique IDs copied to clipboard";
    pub const NOTHING_TO_COPY: &str = "No Unique IDs to copy";
    pub const COPY_FAILED: &str = "Could not copy to clipboard";
    pub const TORCH_UNAVAILABLE: &str = "Flashlight unavailable";
    pub const WAITING: &str = "Point the camera at a barcode";
}

/// Barcode decoding settings
pub mod decoding {
    /// Frames larger than this (in either dimension) are downscaled before decoding
    pub const DEFAULT_MAX_DIMENSION: u32 = 640;

    /// Smallest accepted max dimension, below this codes become unreadable
    pub const MIN_MAX_DIMENSION: u32 = 64;
}

/// Camera capture settings
pub mod capture {
    use super::Duration;

    pub const DEFAULT_DEVICE: &str = "/dev/video0";
    pub const DEFAULT_WIDTH: u32 = 640;
    pub const DEFAULT_HEIGHT: u32 = 480;

    /// Number of mmap buffers requested from V4L2
    pub const V4L2_BUFFER_COUNT: u32 = 4;

    /// Pause before retrying after a failed dequeue
    pub const RETRY_DELAY: Duration = Duration::from_millis(10);

    /// Default replay rate for image sequences
    pub const DEFAULT_SEQUENCE_FPS: u32 = 5;
}

/// Terminal UI timing
pub mod ui {
    use super::Duration;

    /// Input poll interval, also bounds the preview refresh rate
    pub const POLL_INTERVAL: Duration = Duration::from_millis(16);

    /// How long toast notices stay visible by default
    pub const DEFAULT_TOAST_MS: u64 = 2000;
}
