// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner application

use std::fmt;

use crate::backends::camera::types::BackendError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Barcode scanning errors
    Scan(ScanError),
    /// A link could not be parsed or handed to the system viewer
    Browser(String),
    /// Clipboard errors
    Clipboard(String),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// No camera devices found
    NoCameraFound,
    /// Access to the camera device was refused
    PermissionDenied(String),
    /// Camera initialization failed
    InitializationFailed(String),
    /// Backend error
    BackendError(String),
}

/// Barcode decoding errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Frame layout could not be interpreted
    UnsupportedFrame(String),
    /// Decoder task aborted before producing a result
    DecoderAborted(String),
    /// Decoder reported a failure
    DecodeFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Scan(e) => write!(f, "Scan error: {}", e),
            AppError::Browser(msg) => write!(f, "Cannot open link: {}", msg),
            AppError::Clipboard(msg) => write!(f, "Clipboard error: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            CameraError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            CameraError::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::UnsupportedFrame(msg) => write!(f, "Unsupported frame: {}", msg),
            ScanError::DecoderAborted(msg) => write!(f, "Decoder aborted: {}", msg),
            ScanError::DecodeFailed(msg) => write!(f, "Decode failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for ScanError {}

impl CameraError {
    /// Whether this error means scanning cannot work for the rest of the session
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, CameraError::PermissionDenied(_))
    }
}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        AppError::Scan(err)
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::PermissionDenied(msg) => CameraError::PermissionDenied(msg),
            BackendError::DeviceNotFound(_) => CameraError::NoCameraFound,
            BackendError::InitializationFailed(msg) => CameraError::InitializationFailed(msg),
            other => CameraError::BackendError(other.to_string()),
        }
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err.into())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}
