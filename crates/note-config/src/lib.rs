//! Configuration loading and parsing.
//!
//! Parses `richnotes.toml`: the autosave quiet window and the
//! status-message lifetime. Discovery prefers
//! a file in the working directory, then the platform config dir.
//! Missing or malformed files fall back to defaults — configuration
//! must never block opening a note. Unknown fields are ignored so the
//! file can grow without breaking older binaries.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf, time::Duration};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
pub struct AutosaveConfig {
    /// Quiet window: edit notifications inside it collapse into one
    /// save request.
    #[serde(default = "AutosaveConfig::default_quiet_ms")]
    pub quiet_ms: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            quiet_ms: Self::default_quiet_ms(),
        }
    }
}

impl AutosaveConfig {
    const fn default_quiet_ms() -> u64 {
        2000
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatusConfig {
    /// How long a transient view-side status message stays visible.
    #[serde(default = "StatusConfig::default_linger_ms")]
    pub linger_ms: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            linger_ms: Self::default_linger_ms(),
        }
    }
}

impl StatusConfig {
    const fn default_linger_ms() -> u64 {
        3000
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub autosave: AutosaveConfig,
    #[serde(default)]
    pub status: StatusConfig,
}

impl Config {
    pub fn quiet_window(&self) -> Duration {
        Duration::from_millis(self.autosave.quiet_ms)
    }

    pub fn status_linger(&self) -> Duration {
        Duration::from_millis(self.status.linger_ms)
    }
}

/// Best-effort config path: working directory first, then the
/// platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("richnotes.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("richnotes").join("richnotes.toml");
    }
    PathBuf::from("richnotes.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<Config>(&content) {
            Ok(cfg) => {
                info!(target: "config", path = %path.display(), "config_loaded");
                Ok(cfg)
            }
            Err(_e) => {
                // Parse error falls back to defaults.
                Ok(Config::default())
            }
        }
    } else {
        Ok(Config::default())
    }
}
