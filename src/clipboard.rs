// SPDX-License-Identifier: GPL-3.0-only

//! Clipboard access

use crate::errors::{AppError, AppResult};
use tracing::info;

/// Receives text to place on the clipboard
pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> AppResult<()>;
}

/// The desktop clipboard
///
/// A handle is opened per copy. On X11, dropping it hands the text over to
/// the clipboard manager when one is running.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> AppResult<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| AppError::Clipboard(e.to_string()))?;

        clipboard
            .set_text(text)
            .map_err(|e| AppError::Clipboard(e.to_string()))?;

        info!(text_length = text.len(), "Copied text to clipboard");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_map_to_clipboard_error() {
        // Without a display server the clipboard cannot be opened
        match SystemClipboard.set_text("ABC123") {
            Ok(()) => {}
            Err(AppError::Clipboard(msg)) => assert!(!msg.is_empty()),
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
}
