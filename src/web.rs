// SPDX-License-Identifier: GPL-3.0-only

//! Web display surface
//!
//! Shows a single page given by URL. Rendering is left to the system's web
//! viewer; this surface only validates the URL before handing it over.

use crate::errors::AppResult;
use crate::scanner::{BrowserLauncher, parse_link};
use tracing::info;

/// A page to display, with its viewer settings
///
/// The settings are declarative: they state what the page needs and are
/// logged when it is shown, but the system viewer cannot be configured
/// from here, so they do not change how the page is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebScreen {
    url: String,
    /// Page expects scripting to be available
    javascript_enabled: bool,
    /// Page expects `localStorage`/`sessionStorage` to be available
    dom_storage_enabled: bool,
}

impl WebScreen {
    /// Prepare a page for `url`; scripting and DOM storage are enabled
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            javascript_enabled: true,
            dom_storage_enabled: true,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn javascript_enabled(&self) -> bool {
        self.javascript_enabled
    }

    pub fn dom_storage_enabled(&self) -> bool {
        self.dom_storage_enabled
    }

    /// Validate the URL and hand it to the viewer
    pub fn show(&self, viewer: &dyn BrowserLauncher) -> AppResult<()> {
        let link = parse_link(&self.url)?;
        info!(
            url = %self.url,
            host = %link.host,
            javascript = self.javascript_enabled,
            dom_storage = self.dom_storage_enabled,
            "Showing web page"
        );
        viewer.open_externally(&self.url)
    }
}
