use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::session::SessionConfig;

pub const API_URL_ENV: &str = "MATH_BOARD_API_URL";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Base URL of the evaluation service; requests go to `<api_url>/calculate/`.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Seconds before an evaluation request is abandoned.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Delay between a response and its results appearing.
    #[serde(default = "default_materialize_delay_ms")]
    pub materialize_delay_ms: u64,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    /// Rows above the surface reserved for other UI.
    #[serde(default)]
    pub top_offset: u32,
    /// When enabled the logger is initialised at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_api_url() -> String {
    "http://localhost:8900".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_materialize_delay_ms() -> u64 {
    200
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    720
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
            materialize_delay_ms: default_materialize_delay_ms(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            top_offset: 0,
            debug_logging: false,
            log_file: None,
        }
    }
}

impl Settings {
    /// Load from `path`. A missing or empty file yields the defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Take the API URL from `MATH_BOARD_API_URL` when it is set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.api_url = url.to_string();
            }
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            materialize_delay: Duration::from_millis(self.materialize_delay_ms),
        }
    }
}
