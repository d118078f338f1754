// SPDX-License-Identifier: GPL-3.0-only

//! Link classification and hand-off to the system browser

use crate::constants::LINK_PREFIX;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Rule deciding which decoded values are opened as links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkPolicy {
    /// Anything starting with "http", including values such as "httpXYZ"
    /// that then fail to parse
    #[default]
    HttpPrefix,
    /// Only values starting with "http://" or "https://"
    WebScheme,
}

impl LinkPolicy {
    pub fn is_link(&self, value: &str) -> bool {
        match self {
            LinkPolicy::HttpPrefix => value.starts_with(LINK_PREFIX),
            LinkPolicy::WebScheme => {
                let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
                lower.starts_with("http://") || lower.starts_with("https://")
            }
        }
    }
}

/// A URL that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Lowercased scheme without the colon
    pub scheme: String,
    /// Host for hierarchical URLs, empty for opaque ones such as `mailto:`
    pub host: String,
}

/// Validate a URL before handing it to another program
///
/// Requires an RFC 3986 scheme. `http` and `https` URLs additionally need
/// `//` and a non-empty host with an optional numeric port.
pub fn parse_link(value: &str) -> AppResult<Link> {
    let invalid = |why: &str| AppError::Browser(format!("{:?}: {}", value, why));

    if value.is_empty() {
        return Err(invalid("empty"));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("contains whitespace"));
    }

    let (scheme, rest) = value.split_once(':').ok_or_else(|| invalid("missing scheme"))?;
    let mut chars = scheme.chars();
    let scheme_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !scheme_ok {
        return Err(invalid("malformed scheme"));
    }
    let scheme = scheme.to_ascii_lowercase();

    let host = match rest.strip_prefix("//") {
        Some(hier) => {
            let authority = hier.split(['/', '?', '#']).next().unwrap_or("");
            let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
            let host = match host_port.rsplit_once(':') {
                // Bracketed IPv6 literals contain colons of their own
                Some((host, port)) if !port.contains(']') => {
                    if !port.is_empty() && !port.chars().all(|c| c.is_ascii_digit()) {
                        return Err(invalid("malformed port"));
                    }
                    host
                }
                _ => host_port,
            };
            host.to_string()
        }
        None => String::new(),
    };

    if matches!(scheme.as_str(), "http" | "https") && host.is_empty() {
        return Err(invalid("missing host"));
    }
    if host.is_empty() && rest.is_empty() {
        return Err(invalid("nothing after scheme"));
    }

    Ok(Link { scheme, host })
}

/// Opens links outside the application
pub trait BrowserLauncher: Send + Sync {
    fn open_externally(&self, url: &str) -> AppResult<()>;
}

/// Launches the desktop's default handler for the URL
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open_externally(&self, url: &str) -> AppResult<()> {
        let link = parse_link(url)?;
        info!(url = %url, scheme = %link.scheme, "Opening link");
        open::that_detached(url).map_err(|e| AppError::Browser(format!("{}: {}", url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_prefix_policy() {
        let policy = LinkPolicy::HttpPrefix;
        assert!(policy.is_link("https://example.com"));
        assert!(policy.is_link("httpnotaurl"));
        assert!(!policy.is_link("HTTPS://EXAMPLE.COM"));
        assert!(!policy.is_link("ABC123"));
    }

    #[test]
    fn test_web_scheme_policy() {
        let policy = LinkPolicy::WebScheme;
        assert!(policy.is_link("https://example.com"));
        assert!(policy.is_link("HTTP://EXAMPLE.COM"));
        assert!(!policy.is_link("httpnotaurl"));
        assert!(!policy.is_link("http"));
    }

    #[test]
    fn test_parse_valid_links() {
        let link = parse_link("https://example.com/path?q=1").unwrap();
        assert_eq!(link.scheme, "https");
        assert_eq!(link.host, "example.com");

        let link = parse_link("http://user@host.local:8080").unwrap();
        assert_eq!(link.host, "host.local");

        let link = parse_link("http://[::1]:3000/").unwrap();
        assert_eq!(link.host, "[::1]");

        assert!(parse_link("mailto:someone@example.com").is_ok());
    }

    #[test]
    fn test_parse_invalid_links() {
        assert!(parse_link("httpXYZ").is_err());
        assert!(parse_link("httpnotaurl").is_err());
        assert!(parse_link("http:").is_err());
        assert!(parse_link("http://").is_err());
        assert!(parse_link("https://exa mple.com").is_err());
        assert!(parse_link("https://example.com:80a").is_err());
        assert!(parse_link("1http://example.com").is_err());
    }
}
