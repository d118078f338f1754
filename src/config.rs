// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON in `<config dir>/scanlink/config.json`. Every field has a
//! default, so partial files are accepted and a missing file means defaults.

use crate::constants::{APP_ID, capture, decoding, ui};
use crate::errors::{AppError, AppResult};
use crate::scanner::LinkPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// V4L2 device node to capture from
    pub camera_device: String,
    /// Requested capture width
    pub capture_width: u32,
    /// Requested capture height
    pub capture_height: u32,
    /// Clockwise rotation of the mounted camera in degrees
    pub camera_rotation: i32,
    /// Frames are downscaled to this size before decoding
    pub max_dimension: u32,
    /// Which decoded values are opened as links
    pub link_policy: LinkPolicy,
    /// Sysfs LED used as torch (auto-discovered when unset)
    pub torch_led: Option<String>,
    /// How long toast notices stay visible
    pub toast_duration_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_device: capture::DEFAULT_DEVICE.to_string(),
            capture_width: capture::DEFAULT_WIDTH,
            capture_height: capture::DEFAULT_HEIGHT,
            camera_rotation: 0,
            max_dimension: decoding::DEFAULT_MAX_DIMENSION,
            link_policy: LinkPolicy::default(),
            torch_led: None,
            toast_duration_ms: ui::DEFAULT_TOAST_MS,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_ID).join("config.json"))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory on this system, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::Config(format!("{}: {}", path.display(), e)));
            }
        };

        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Write the config as pretty-printed JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Config(format!("{}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json + "\n")
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }
}
