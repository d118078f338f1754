// SPDX-License-Identifier: GPL-3.0-only

//! Presentation state driven by scan events
//!
//! The result label shows only the most recently scanned identifier, never
//! the whole set. Toasts overlay the label for a fixed duration.

use super::types::{Notice, NoticeStyle, ScanEvent};
use crate::constants::notices;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Toast {
    text: &'static str,
    expires_at: Instant,
}

/// What the scanning screen currently shows
#[derive(Debug, Clone)]
pub struct DisplayState {
    label: String,
    toast: Option<Toast>,
    toast_duration: Duration,
    torch: bool,
    scanning_blocked: bool,
    last_link: Option<String>,
}

impl DisplayState {
    pub fn new(toast_duration: Duration) -> Self {
        Self {
            label: notices::WAITING.to_string(),
            toast: None,
            toast_duration,
            torch: false,
            scanning_blocked: false,
            last_link: None,
        }
    }

    /// Apply one event from the scan session
    pub fn apply(&mut self, event: ScanEvent, now: Instant) {
        match event {
            ScanEvent::IdentifierScanned(id) => self.set_label(id),
            ScanEvent::LinkOpened(url) => self.last_link = Some(url),
            ScanEvent::Notice(notice) => self.show_notice(notice, now),
            ScanEvent::TorchChanged(enabled) => self.torch = enabled,
        }
    }

    fn show_notice(&mut self, notice: Notice, now: Instant) {
        if notice == Notice::PermissionRequired {
            self.label = notice.text().to_string();
            self.scanning_blocked = true;
            return;
        }
        match notice.style() {
            NoticeStyle::Label => self.set_label(notice.text().to_string()),
            NoticeStyle::Toast => {
                self.toast = Some(Toast {
                    text: notice.text(),
                    expires_at: now + self.toast_duration,
                });
            }
        }
    }

    fn set_label(&mut self, text: String) {
        // The permission notice stays for the rest of the session
        if !self.scanning_blocked {
            self.label = text;
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Toast text if one is still visible at `now`
    pub fn toast(&self, now: Instant) -> Option<&str> {
        self.toast
            .as_ref()
            .filter(|t| now < t.expires_at)
            .map(|t| t.text)
    }

    pub fn torch(&self) -> bool {
        self.torch
    }

    pub fn scanning_blocked(&self) -> bool {
        self.scanning_blocked
    }

    pub fn last_link(&self) -> Option<&str> {
        self.last_link.as_deref()
    }
}
