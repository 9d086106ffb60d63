//! logchurn configuration
//!
//! TOML-based configuration loading with sensible defaults. A missing or
//! empty config file just works - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use logchurn_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[sink]\nrotation_threshold_bytes = 4096").unwrap();
//! assert_eq!(config.sink.rotation_threshold_bytes, 4096);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [harness]
//! producers = 4
//! duration_secs = 30
//!
//! [sink]
//! rotation_threshold_bytes = 102400
//! mode = "sync"
//!
//! [watchdog]
//! sample_interval_ms = 5000
//! ```
//!
//! See `configs/example.toml` for all available options.

mod error;
mod harness;
mod logging;
mod sink;
mod watchdog;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use error::{ConfigError, Result};
pub use harness::HarnessConfig;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use sink::{SinkConfig, SinkMode};
pub use watchdog::WatchdogConfig;

/// Top-level harness configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Producer fleet and session settings
    pub harness: HarnessConfig,

    /// Rotating sink settings
    pub sink: SinkConfig,

    /// Watchdog sampling settings
    pub watchdog: WatchdogConfig,

    /// Harness diagnostic logging
    pub log: LogConfig,
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        content.parse()
    }

    /// Check that every field holds a value the harness can run with
    pub fn validate(&self) -> Result<()> {
        if self.harness.producers == 0 {
            return Err(ConfigError::invalid_value(
                "harness",
                "producers",
                "must be at least 1",
            ));
        }
        if self.harness.duration_secs == 0 {
            return Err(ConfigError::invalid_value(
                "harness",
                "duration_secs",
                "must be at least 1",
            ));
        }
        if self.harness.debug_every == 0 {
            return Err(ConfigError::invalid_value(
                "harness",
                "debug_every",
                "cycle multiple must be at least 1",
            ));
        }
        if self.harness.warn_every == 0 {
            return Err(ConfigError::invalid_value(
                "harness",
                "warn_every",
                "cycle multiple must be at least 1",
            ));
        }
        if self.sink.rotation_threshold_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "sink",
                "rotation_threshold_bytes",
                "must be at least 1",
            ));
        }
        if self.sink.file_prefix.is_empty() {
            return Err(ConfigError::invalid_value(
                "sink",
                "file_prefix",
                "must not be empty",
            ));
        }
        if self.watchdog.sample_interval_ms == 0 {
            return Err(ConfigError::invalid_value(
                "watchdog",
                "sample_interval_ms",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
