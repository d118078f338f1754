// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for capture loops
//!
//! Every camera backend runs its frame producer on a dedicated thread.
//! [`CaptureLoop`] owns that thread: it runs a setup step first and
//! reports its outcome to the caller before the loop starts, so device
//! errors (missing device, permission denied) surface from `start()`
//! rather than being lost in a background thread.

use super::types::{BackendError, BackendResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Action returned by the loop body to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Handle to a capture loop running on its own thread
///
/// Dropping the handle stops the loop and joins the thread.
pub struct CaptureLoop {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl CaptureLoop {
    /// Start a capture loop
    ///
    /// `init_fn` runs first on the new thread and builds the loop state.
    /// This call blocks until it has finished; its error is returned here
    /// and the thread exits without running `loop_fn`.
    ///
    /// `loop_fn` is then called repeatedly until it returns
    /// [`LoopAction::Stop`] or the loop is stopped from outside.
    pub fn spawn<S, I, F>(name: &str, init_fn: I, mut loop_fn: F) -> BackendResult<Self>
    where
        S: 'static,
        I: FnOnce() -> BackendResult<S> + Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_signal);
        let thread_name = name.to_string();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<BackendResult<()>>(1);

        info!(name = %name, "Starting capture loop");

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut state = match init_fn() {
                    Ok(state) => {
                        let _ = ready_tx.send(Ok(()));
                        state
                    }
                    Err(e) => {
                        warn!(name = %thread_name, error = %e, "Capture loop setup failed");
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                debug!(name = %thread_name, "Capture loop running");

                while !thread_stop.load(Ordering::SeqCst) {
                    if loop_fn(&mut state) == LoopAction::Stop {
                        debug!(name = %thread_name, "Loop requested stop");
                        break;
                    }
                }

                info!(name = %thread_name, "Capture loop thread exiting");
            })
            .map_err(|e| BackendError::Other(format!("Failed to spawn {}: {}", name, e)))?;

        let mut controller = Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        };

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(controller),
            Ok(Err(e)) => {
                controller.join();
                Err(e)
            }
            Err(_) => {
                controller.join();
                Err(BackendError::InitializationFailed(format!(
                    "{} exited during setup",
                    name
                )))
            }
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        debug!(name = %self.name, "Requesting capture loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
        self.join();
    }

    /// Wait for the thread to finish without sending the stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Capture loop thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Capture loop thread finished");
            }
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[test]
    fn test_loop_stops_itself() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut controller = CaptureLoop::spawn(
            "test-loop",
            || Ok(()),
            move |_| {
                let count = counter_clone.fetch_add(1, Ordering::SeqCst);
                if count >= 10 {
                    LoopAction::Stop
                } else {
                    LoopAction::Continue
                }
            },
        )
        .unwrap();

        controller.join();
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_stop_signal() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut controller = CaptureLoop::spawn(
            "test-loop",
            || Ok(()),
            move |_| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(10));
                LoopAction::Continue
            },
        )
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        assert!(controller.is_running());

        controller.stop();
        assert!(!controller.is_running());
        assert!(counter.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn test_state_from_init() {
        let result = Arc::new(AtomicU32::new(0));
        let result_clone = Arc::clone(&result);

        let mut controller = CaptureLoop::spawn(
            "test-init-loop",
            || Ok(42u32),
            move |state| {
                result_clone.store(*state, Ordering::SeqCst);
                LoopAction::Stop
            },
        )
        .unwrap();

        controller.join();
        assert_eq!(result.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_init_error_is_returned() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);

        let result = CaptureLoop::spawn(
            "test-fail-init",
            || Err::<(), _>(BackendError::PermissionDenied("/dev/video0".into())),
            move |_| {
                ran_clone.store(true, Ordering::SeqCst);
                LoopAction::Stop
            },
        );

        assert!(matches!(result, Err(BackendError::PermissionDenied(_))));
        assert!(!ran.load(Ordering::SeqCst));
    }
}
