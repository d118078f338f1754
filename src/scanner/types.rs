// SPDX-License-Identifier: GPL-3.0-only

//! Core types for scan results
//!
//! These types flow from the analysis worker to the presentation layer.

use crate::constants::notices;
use crate::errors::ScanError;

/// Payload of one recognised symbol; `None` when it could not be read
pub type DecodedValue = Option<String>;

/// Outcome of decoding one frame
pub type DecodeResult = Result<Vec<DecodedValue>, ScanError>;

/// How a notice is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeStyle {
    /// Replaces the result label until the next result
    Label,
    /// Shown briefly on top of the current label
    Toast,
}

/// User-visible notices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A symbol was found but carried no readable value
    NoValue,
    /// The decoder failed on a frame
    ScanFailed,
    /// A link could not be opened
    InvalidUrl,
    /// Camera access was refused, scanning is unavailable for this session
    PermissionRequired,
    /// Identifiers were copied to the clipboard
    Copied(usize),
    /// Copy requested with an empty identifier set
    NothingToCopy,
    /// The clipboard rejected the text
    CopyFailed,
    /// The torch could not be switched
    TorchUnavailable,
}

impl Notice {
    pub fn text(&self) -> &'static str {
        match self {
            Notice::NoValue => notices::NO_VALUE,
            Notice::ScanFailed => notices::SCAN_FAILED,
            Notice::InvalidUrl => notices::INVALID_URL,
            Notice::PermissionRequired => notices::PERMISSION_REQUIRED,
            Notice::Copied(_) => notices::COPIED,
            Notice::NothingToCopy => notices::NOTHING_TO_COPY,
            Notice::CopyFailed => notices::COPY_FAILED,
            Notice::TorchUnavailable => notices::TORCH_UNAVAILABLE,
        }
    }

    pub fn style(&self) -> NoticeStyle {
        match self {
            Notice::NoValue | Notice::ScanFailed | Notice::PermissionRequired => NoticeStyle::Label,
            Notice::InvalidUrl
            | Notice::Copied(_)
            | Notice::NothingToCopy
            | Notice::CopyFailed
            | Notice::TorchUnavailable => NoticeStyle::Toast,
        }
    }
}

/// Messages sent from the scan session to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A plain identifier was scanned and should be displayed
    IdentifierScanned(String),
    /// A link was handed to the system viewer
    LinkOpened(String),
    /// Something to tell the user
    Notice(Notice),
    /// Torch state after a toggle
    TorchChanged(bool),
}

impl From<Notice> for ScanEvent {
    fn from(notice: Notice) -> Self {
        ScanEvent::Notice(notice)
    }
}
