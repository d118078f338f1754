// SPDX-License-Identifier: GPL-3.0-only

//! Torch LED control via Linux sysfs
//!
//! Discovers LEDs exposed at `/sys/class/leds/*:flash` or `*:torch` and
//! drives them through the `brightness` file, which is group-writable on
//! most phone distributions.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const LEDS_DIR: &str = "/sys/class/leds";

/// A torch-capable LED discovered via sysfs
#[derive(Debug, Clone)]
pub struct TorchDevice {
    /// Sysfs path, e.g. `/sys/class/leds/white:flash`
    path: PathBuf,
    /// Maximum brightness value (from `max_brightness` file)
    max_brightness: u32,
    /// Directory basename
    name: String,
}

impl TorchDevice {
    /// Find the first usable torch LED
    ///
    /// With `preferred` set, only the LED with that name is considered.
    pub fn discover(preferred: Option<&str>) -> io::Result<TorchDevice> {
        Self::discover_in(Path::new(LEDS_DIR), preferred)
    }

    pub(crate) fn discover_in(leds_dir: &Path, preferred: Option<&str>) -> io::Result<TorchDevice> {
        let mut candidates: Vec<TorchDevice> = Vec::new();
        let mut last_error: Option<io::Error> = None;

        for entry in std::fs::read_dir(leds_dir)?.flatten() {
            let name = entry.file_name();
            let Some(name_str) = name.to_str() else {
                continue;
            };

            let matches = match preferred {
                Some(wanted) => name_str == wanted,
                None => name_str.ends_with(":flash") || name_str.ends_with(":torch"),
            };
            if !matches {
                continue;
            }

            match Self::open(&entry.path(), name_str) {
                Ok(device) => candidates.push(device),
                Err(e) => {
                    warn!(name = name_str, error = %e, "Torch LED not usable");
                    last_error = Some(e);
                }
            }
        }

        // Deterministic choice when several LEDs exist (white before yellow)
        candidates.sort_by(|a, b| a.name.cmp(&b.name));

        match candidates.into_iter().next() {
            Some(device) => {
                info!(name = %device.name, max = device.max_brightness, "Using torch LED");
                Ok(device)
            }
            None => Err(last_error
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no torch LED found"))),
        }
    }

    fn open(led_path: &Path, name: &str) -> io::Result<TorchDevice> {
        let raw = std::fs::read_to_string(led_path.join("max_brightness"))?;
        let max_brightness = match raw.trim().parse::<u32>() {
            Ok(v) if v > 0 => v,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid max_brightness {:?}", raw.trim()),
                ));
            }
        };

        // Fail early when brightness is not writable (user not in the LED group)
        std::fs::OpenOptions::new()
            .write(true)
            .open(led_path.join("brightness"))?;

        Ok(TorchDevice {
            path: led_path.to_path_buf(),
            max_brightness,
            name: name.to_string(),
        })
    }

    /// Get the device name (e.g. "white:flash")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Switch the LED fully on or off
    pub fn set_enabled(&self, enabled: bool) -> io::Result<()> {
        let value = if enabled { self.max_brightness } else { 0 };
        debug!(name = %self.name, value, "Setting torch brightness");
        std::fs::write(self.path.join("brightness"), value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_led(root: &Path, name: &str, max: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("max_brightness"), max).unwrap();
        std::fs::write(dir.join("brightness"), "0").unwrap();
    }

    #[test]
    fn test_discover_and_toggle() {
        let root = tempfile::tempdir().unwrap();
        fake_led(root.path(), "yellow:flash", "255");
        fake_led(root.path(), "white:flash", "100");
        fake_led(root.path(), "green:status", "1");

        let device = TorchDevice::discover_in(root.path(), None).unwrap();
        assert_eq!(device.name(), "white:flash");

        device.set_enabled(true).unwrap();
        let value = std::fs::read_to_string(root.path().join("white:flash/brightness")).unwrap();
        assert_eq!(value, "100");

        device.set_enabled(false).unwrap();
        let value = std::fs::read_to_string(root.path().join("white:flash/brightness")).unwrap();
        assert_eq!(value, "0");
    }

    #[test]
    fn test_invalid_max_brightness_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        fake_led(root.path(), "white:torch", "0");

        let err = TorchDevice::discover_in(root.path(), None).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_preferred_name() {
        let root = tempfile::tempdir().unwrap();
        fake_led(root.path(), "white:flash", "10");
        fake_led(root.path(), "rear-led", "10");

        let device = TorchDevice::discover_in(root.path(), Some("rear-led")).unwrap();
        assert_eq!(device.name(), "rear-led");
    }
}
