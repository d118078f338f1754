// SPDX-License-Identifier: GPL-3.0-only

//! Result routing and the session's identifier set
//!
//! Every decoded value ends up in one of three places: links go to the
//! browser launcher, plain identifiers go into the [`IdentifierSet`] and the
//! result label, and unreadable symbols produce a "no value" notice.

use super::links::{BrowserLauncher, LinkPolicy};
use super::types::{DecodedValue, Notice, ScanEvent};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Deduplicated identifiers scanned during one session
///
/// Cloning yields another handle to the same set. Inserts and snapshots
/// take the same lock, so a snapshot never observes a partial insert.
#[derive(Debug, Clone, Default)]
pub struct IdentifierSet {
    inner: Arc<Mutex<BTreeSet<String>>>,
}

impl IdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<String>> {
        // A panic while holding the lock cannot leave a BTreeSet half-updated
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert an identifier; returns false if it was already present
    pub fn insert(&self, id: &str) -> bool {
        self.lock().insert(id.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current members, sorted
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    /// Members joined by newlines, for the clipboard
    pub fn export_text(&self) -> String {
        self.snapshot().join("\n")
    }
}

/// Classifies decoded values and dispatches them
pub struct ResultRouter {
    identifiers: IdentifierSet,
    policy: LinkPolicy,
    browser: Arc<dyn BrowserLauncher>,
}

impl ResultRouter {
    pub fn new(policy: LinkPolicy, browser: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            identifiers: IdentifierSet::new(),
            policy,
            browser,
        }
    }

    pub fn identifiers(&self) -> &IdentifierSet {
        &self.identifiers
    }

    pub fn policy(&self) -> LinkPolicy {
        self.policy
    }

    /// Route one decoded value and describe what the user should see
    pub fn route(&self, value: DecodedValue) -> ScanEvent {
        let Some(value) = value else {
            warn!("Barcode value is missing");
            return Notice::NoValue.into();
        };

        if self.policy.is_link(&value) {
            return match self.browser.open_externally(&value) {
                Ok(()) => ScanEvent::LinkOpened(value),
                Err(e) => {
                    warn!(url = %value, error = %e, "Failed to open URL");
                    Notice::InvalidUrl.into()
                }
            };
        }

        if self.identifiers.insert(&value) {
            info!(total = self.identifiers.len(), "New identifier scanned");
        } else {
            debug!("Identifier already collected");
        }
        ScanEvent::IdentifierScanned(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppError, AppResult};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBrowser {
        opened: Mutex<Vec<String>>,
    }

    impl BrowserLauncher for RecordingBrowser {
        fn open_externally(&self, url: &str) -> AppResult<()> {
            super::super::links::parse_link(url)?;
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    struct BrokenBrowser;

    impl BrowserLauncher for BrokenBrowser {
        fn open_externally(&self, url: &str) -> AppResult<()> {
            Err(AppError::Browser(url.to_string()))
        }
    }

    #[test]
    fn test_identifier_set_snapshot_is_detached() {
        let set = IdentifierSet::new();
        set.insert("B");
        set.insert("A");
        let snapshot = set.snapshot();
        set.insert("C");

        assert_eq!(snapshot, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(set.export_text(), "A\nB\nC");
    }

    #[test]
    fn test_identifier_set_is_idempotent() {
        let set = IdentifierSet::new();
        assert!(set.insert("ABC123"));
        assert!(!set.insert("ABC123"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_launch_failure_becomes_notice() {
        let router = ResultRouter::new(LinkPolicy::HttpPrefix, Arc::new(BrokenBrowser));
        assert_eq!(
            router.route(Some("https://example.com".into())),
            ScanEvent::Notice(Notice::InvalidUrl)
        );
        assert!(router.identifiers().is_empty());
    }

    #[test]
    fn test_web_scheme_policy_collects_http_lookalikes() {
        let browser = Arc::new(RecordingBrowser::default());
        let router = ResultRouter::new(LinkPolicy::WebScheme, browser.clone());

        let event = router.route(Some("httpXYZ".into()));
        assert_eq!(event, ScanEvent::IdentifierScanned("httpXYZ".into()));
        assert!(router.identifiers().contains("httpXYZ"));
        assert!(browser.opened.lock().unwrap().is_empty());
    }
}
