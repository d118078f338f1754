// SPDX-License-Identifier: GPL-3.0-only

//! Scan session controller
//!
//! A [`ScanSession`] holds all mutable scanning state for one screen: the
//! gate, the router with its identifier set, and the torch state. Results
//! are never applied to the display directly; they are sent as
//! [`ScanEvent`]s to whoever owns the receiving end of the channel.

use super::gate::{ScanGate, Submission};
use super::router::{IdentifierSet, ResultRouter};
use super::types::{DecodeResult, Notice, ScanEvent};
use super::links::SystemBrowser;
use super::tasks::QrDetector;
use super::Decoder;
use crate::backends::camera::{CameraBackend, CameraFrame, FrameStream};
use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::errors::CameraError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub struct ScanSession {
    id: Uuid,
    gate: ScanGate,
    decoder: Arc<dyn Decoder>,
    router: ResultRouter,
    torch: AtomicBool,
    events: mpsc::UnboundedSender<ScanEvent>,
}

impl ScanSession {
    /// Create a session and the receiver its events are delivered to
    pub fn new(
        decoder: Arc<dyn Decoder>,
        router: ResultRouter,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<ScanEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let session = Arc::new(Self {
            id: Uuid::new_v4(),
            gate: ScanGate::new(),
            decoder,
            router,
            torch: AtomicBool::new(false),
            events,
        });
        info!(session = %session.id, policy = ?session.router.policy(), "Scan session created");
        (session, receiver)
    }

    /// Session with the QR decoder and system browser, tuned by `config`
    pub fn from_config(config: &Config) -> (Arc<Self>, mpsc::UnboundedReceiver<ScanEvent>) {
        let decoder = QrDetector::with_max_dimension(config.max_dimension);
        let router = ResultRouter::new(config.link_policy, Arc::new(SystemBrowser));
        Self::new(Arc::new(decoder), router)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn gate(&self) -> &ScanGate {
        &self.gate
    }

    pub fn identifiers(&self) -> &IdentifierSet {
        self.router.identifiers()
    }

    pub fn torch_enabled(&self) -> bool {
        self.torch.load(Ordering::Acquire)
    }

    /// Run frame analysis on a background task until the stream ends
    pub fn spawn_analyzer(self: &Arc<Self>, frames: FrameStream) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).analyze(frames))
    }

    /// Feed every frame of the stream through the gate
    pub async fn analyze(self: Arc<Self>, mut frames: FrameStream) {
        info!(session = %self.id, "Frame analysis started");
        while let Some(frame) = frames.next_frame().await {
            self.submit(frame);
        }
        info!(
            session = %self.id,
            admitted = self.gate.admitted_count(),
            dropped = self.gate.dropped_count(),
            "Frame stream ended, analysis stopped"
        );
    }

    /// Offer one frame to the gate
    pub fn submit(self: &Arc<Self>, frame: CameraFrame) -> Submission {
        let session = Arc::clone(self);
        self.gate
            .submit(frame, self.decoder.as_ref(), move |result| session.complete(result))
    }

    fn complete(&self, result: DecodeResult) {
        match result {
            Ok(values) => {
                debug!(count = values.len(), "Barcodes found");
                for value in values {
                    let event = self.router.route(value);
                    self.emit(event);
                }
            }
            Err(e) => {
                error!(error = %e, "Barcode scan failed");
                self.emit(Notice::ScanFailed.into());
            }
        }
    }

    fn emit(&self, event: ScanEvent) {
        if self.events.send(event).is_err() {
            debug!(session = %self.id, "Presentation closed, event discarded");
        }
    }

    /// Report a camera failure to the presentation layer
    pub fn report_camera_error(&self, err: &CameraError) {
        error!(error = %err, "Camera unavailable");
        if err.is_permission_denied() {
            self.emit(Notice::PermissionRequired.into());
        } else {
            self.emit(Notice::ScanFailed.into());
        }
    }

    /// Copy the identifier set to the clipboard
    ///
    /// The text is built from a snapshot, so scans completing meanwhile do
    /// not affect what is copied.
    pub fn copy_identifiers(&self, clipboard: &dyn Clipboard) -> Notice {
        let snapshot = self.identifiers().snapshot();
        let notice = if snapshot.is_empty() {
            Notice::NothingToCopy
        } else {
            match clipboard.set_text(&snapshot.join("\n")) {
                Ok(()) => {
                    info!(count = snapshot.len(), "Identifiers copied to clipboard");
                    Notice::Copied(snapshot.len())
                }
                Err(e) => {
                    warn!(error = %e, "Failed to copy identifiers");
                    Notice::CopyFailed
                }
            }
        };
        self.emit(notice.clone().into());
        notice
    }

    /// Flip the torch state and drive the camera's LED to match
    ///
    /// The state follows the user's toggle even when the hardware refuses.
    pub fn toggle_torch(&self, camera: &mut dyn CameraBackend) -> bool {
        let enabled = !self.torch.fetch_xor(true, Ordering::AcqRel);
        info!(enabled, "Torch toggled");
        if let Err(e) = camera.set_torch(enabled) {
            warn!(error = %e, "Failed to switch torch");
            self.emit(Notice::TorchUnavailable.into());
        }
        self.emit(ScanEvent::TorchChanged(enabled));
        enabled
    }
}
