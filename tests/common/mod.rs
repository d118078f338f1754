// SPDX-License-Identifier: GPL-3.0-only

//! Test doubles shared by the integration tests

#![allow(dead_code)]

use futures::FutureExt;
use futures::future::BoxFuture;
use scanlink::backends::camera::{
    BackendError, BackendResult, CameraBackend, CameraFrame, FrameSink, PixelFormat,
};
use scanlink::clipboard::Clipboard;
use scanlink::errors::{AppError, AppResult};
use scanlink::scanner::{BrowserLauncher, DecodeResult, Decoder, parse_link};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn blank_frame() -> CameraFrame {
    CameraFrame::new(8, 8, PixelFormat::Gray8, vec![255u8; 64])
}

/// Browser that validates like the real one and records what it opened
#[derive(Default)]
pub struct RecordingBrowser {
    pub opened: Mutex<Vec<String>>,
}

impl BrowserLauncher for RecordingBrowser {
    fn open_externally(&self, url: &str) -> AppResult<()> {
        parse_link(url)?;
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

impl RecordingBrowser {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

/// Decoder returning queued results in order, then `fallback`
pub struct ScriptedDecoder {
    script: Mutex<VecDeque<DecodeResult>>,
    fallback: DecodeResult,
    calls: AtomicUsize,
}

impl ScriptedDecoder {
    pub fn new(script: Vec<DecodeResult>) -> Self {
        Self::with_fallback(script, Ok(Vec::new()))
    }

    pub fn with_fallback(script: Vec<DecodeResult>, fallback: DecodeResult) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Decoder for ScriptedDecoder {
    fn decode(&self, _frame: CameraFrame) -> BoxFuture<'static, DecodeResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        async move { result }.boxed()
    }
}

/// Clipboard that keeps every text it receives, or refuses all of them
#[derive(Default)]
pub struct RecordingClipboard {
    pub texts: Mutex<Vec<String>>,
    pub broken: bool,
}

impl Clipboard for RecordingClipboard {
    fn set_text(&self, text: &str) -> AppResult<()> {
        if self.broken {
            return Err(AppError::Clipboard("clipboard unavailable".into()));
        }
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Camera whose torch can never be switched
pub struct NoTorchCamera;

impl CameraBackend for NoTorchCamera {
    fn name(&self) -> &str {
        "no torch"
    }

    fn start(&mut self, _sink: FrameSink) -> BackendResult<()> {
        Ok(())
    }

    fn stop(&mut self) {}

    fn is_running(&self) -> bool {
        false
    }

    fn set_torch(&mut self, _enabled: bool) -> BackendResult<()> {
        Err(BackendError::NotAvailable("no flash LED".into()))
    }
}
