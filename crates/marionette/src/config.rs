//! # Host Configuration
//!
//! Loaded from a TOML file once at startup; every field has a default so
//! a missing file or a partial file both work.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors from loading the host configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this shape.
    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Host-level settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Owner-loop tick rate in Hz.
    pub tick_rate: u32,
    /// Upper bound, in milliseconds, for scripts blocked on a read.
    pub call_timeout_ms: u64,
    /// Viewport width used for centering top-level windows.
    pub viewport_width: i32,
    /// Viewport height used for centering top-level windows.
    pub viewport_height: i32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            call_timeout_ms: 500,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

impl HostConfig {
    /// Loads the configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] when the file cannot be read,
    /// [`ConfigError::Parse`] when it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// The blocking-read bound as a [`Duration`].
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Duration of one owner-loop tick.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.tick_rate.max(1)))
    }
}
