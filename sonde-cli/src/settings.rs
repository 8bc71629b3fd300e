//! CLI settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sonde_detect::DeviceDetector;
use sonde_link::QueryConfig;

/// Settings read from `settings.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Board signature override (defaults to the Arduino vendor id)
    #[serde(default)]
    pub vendor_id: Option<u16>,
    /// Deadline for one reply line
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Longest single wait for inbound bytes
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Channels read when none are given on the command line
    #[serde(default)]
    pub channels: Vec<String>,
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vendor_id: None,
            timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            channels: Vec::new(),
        }
    }
}

impl Settings {
    /// Get the XDG config directory for sonde
    /// Uses $XDG_CONFIG_HOME/sonde, falls back to ~/.config/sonde
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("sonde"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("sonde"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring unreadable settings in {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::settings_path().context("Could not determine settings path")?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        Ok(())
    }

    pub fn query_config(&self) -> QueryConfig {
        QueryConfig {
            timeout: Duration::from_millis(self.timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn detector(&self) -> DeviceDetector {
        match self.vendor_id {
            Some(vid) => DeviceDetector::with_vendor_id(vid),
            None => DeviceDetector::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("sonde-settings-{}-{}", std::process::id(), name))
            .join("settings.json")
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.query_config(), QueryConfig::default());
        assert_eq!(settings.detector().vendor_id(), 0x2341);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"vendor_id": 10755}"#).unwrap();
        assert_eq!(settings.vendor_id, Some(0x2A03));
        assert_eq!(settings.timeout_ms, 1000);
        assert_eq!(settings.detector().vendor_id(), 0x2A03);
    }

    #[test]
    fn test_save_and_load() {
        let path = scratch_path("roundtrip");
        let settings = Settings {
            vendor_id: None,
            timeout_ms: 250,
            poll_interval_ms: 5,
            channels: vec!["A0".to_string(), "i1".to_string()],
        };

        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_missing_or_corrupt_file() {
        let path = scratch_path("corrupt");
        assert_eq!(Settings::load_from(&path), Settings::default());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
