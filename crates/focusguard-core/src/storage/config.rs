//! TOML-based ambient preferences.
//!
//! Covers the fire-and-forget surfaces only: whether notifications, the
//! chime, and ambient audio are emitted at all. The session record itself
//! (blocklist, durations, loop flag) lives in the key-value store, not
//! here.
//!
//! Stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Notification preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub chime: bool,
}

/// Audio preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Looping ambient stream during focus sessions.
    #[serde(default = "default_true")]
    pub ambient: bool,
}

/// Ambient application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true, chime: true }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { ambient: true }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("<data dir>"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the default file on first use.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or the
    /// default cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| ConfigError::LoadFailed { path, message: e.to_string() }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed { path: path.clone(), message: e.to_string() })?;
        std::fs::write(&path, content)
            .map_err(|e| ConfigError::SaveFailed { path, message: e.to_string() })
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert!(parsed.notifications.enabled);
        assert!(parsed.notifications.chime);
        assert!(parsed.audio.ambient);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[notifications]\nenabled = false\n").unwrap();
        assert!(!parsed.notifications.enabled);
        assert!(parsed.notifications.chime);
        assert!(parsed.audio.ambient);
    }
}
