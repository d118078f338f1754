// SPDX-License-Identifier: GPL-3.0-only

//! Single-flight admission of frames to the decoder
//!
//! Frames arrive faster than they can be decoded. The gate lets exactly one
//! decode run at a time and drops every frame submitted in the meantime.
//! It is lossy on purpose: nothing is queued and the producer is never
//! slowed down.
//!
//! ```text
//!            submit (admitted)
//!   Idle ─────────────────────────► Decoding
//!    ▲                                 │
//!    └──────── completion ─────────────┘
//!   (submit while Decoding drops the frame)
//! ```

use super::Decoder;
use super::types::DecodeResult;
use crate::backends::camera::CameraFrame;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::task::JoinHandle;
use tracing::trace;

/// Observable gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Decoding,
}

/// What happened to a submitted frame
#[derive(Debug)]
pub enum Submission {
    /// A decode was already running; the frame was released unread
    Dropped,
    /// The frame is being decoded; the handle finishes after the completion callback
    Admitted(JoinHandle<()>),
}

impl Submission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Submission::Admitted(_))
    }
}

/// Proof that the holder owns the single decode slot
///
/// Dropping the permit reopens the gate. It moves into the decode task, so
/// the gate reopens on every exit path, including panics and runtime
/// shutdown.
#[derive(Debug)]
pub struct GatePermit {
    busy: Arc<AtomicBool>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
        trace!("Scan gate reopened");
    }
}

#[derive(Debug, Default)]
struct GateCounters {
    admitted: AtomicU64,
    dropped: AtomicU64,
}

/// Admission control over decode submissions
#[derive(Debug, Clone, Default)]
pub struct ScanGate {
    busy: Arc<AtomicBool>,
    counters: Arc<GateCounters>,
}

impl ScanGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GateState {
        if self.busy.load(Ordering::Acquire) {
            GateState::Decoding
        } else {
            GateState::Idle
        }
    }

    /// Claim the decode slot if it is free
    pub fn try_admit(&self) -> Option<GatePermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GatePermit {
                busy: Arc::clone(&self.busy),
            })
    }

    /// Submit a frame for decoding
    ///
    /// Never blocks. When admitted, the decode runs on a spawned tokio task
    /// and `on_complete` receives its result before the gate reopens.
    /// Must be called from within a tokio runtime.
    pub fn submit<F>(&self, frame: CameraFrame, decoder: &dyn Decoder, on_complete: F) -> Submission
    where
        F: FnOnce(DecodeResult) + Send + 'static,
    {
        let Some(permit) = self.try_admit() else {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            trace!("Decode in flight, dropping frame");
            return Submission::Dropped;
        };

        self.counters.admitted.fetch_add(1, Ordering::Relaxed);
        // The decoder future owns the frame and releases it when it finishes
        let decode = decoder.decode(frame);

        Submission::Admitted(tokio::spawn(async move {
            let _permit = permit;
            let result = decode.await;
            on_complete(result);
        }))
    }

    /// Number of frames handed to the decoder
    pub fn admitted_count(&self) -> u64 {
        self.counters.admitted.load(Ordering::Relaxed)
    }

    /// Number of frames dropped because a decode was in flight
    pub fn dropped_count(&self) -> u64 {
        self.counters.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permit_is_exclusive_and_released_on_drop() {
        let gate = ScanGate::new();
        assert_eq!(gate.state(), GateState::Idle);

        let permit = gate.try_admit().expect("gate starts idle");
        assert_eq!(gate.state(), GateState::Decoding);
        assert!(gate.try_admit().is_none());

        drop(permit);
        assert_eq!(gate.state(), GateState::Idle);
        assert!(gate.try_admit().is_some());
    }

    #[test]
    fn test_clones_share_the_slot() {
        let gate = ScanGate::new();
        let other = gate.clone();
        let _permit = gate.try_admit().unwrap();
        assert_eq!(other.state(), GateState::Decoding);
    }
}
