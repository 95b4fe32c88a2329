//! Application settings management

use crate::PathManager;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";
pub const DEFAULT_SESSION_IDLE_MINUTES: u64 = 60;

/// Application settings stored in settings.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the Ollama server
    pub ollama_url: String,
    /// Model selected for new browser sessions
    pub default_model: String,
    /// Address the web server listens on
    pub bind: String,
    /// Browser sessions idle for longer than this are dropped
    pub session_idle_minutes: u64,
    /// Also write logs to the platform log directory
    pub log_to_file: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            bind: DEFAULT_BIND.to_string(),
            session_idle_minutes: DEFAULT_SESSION_IDLE_MINUTES,
            log_to_file: false,
        }
    }
}

impl Settings {
    /// Idle time after which a browser session is dropped. Saturates instead
    /// of overflowing for huge configured values.
    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes.saturating_mul(60))
    }

    /// Load settings from the settings file, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = PathManager::settings_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load settings from `path`. A missing or invalid file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };

        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring invalid settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}
