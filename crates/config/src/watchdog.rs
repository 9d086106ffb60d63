//! Watchdog settings

use serde::Deserialize;

/// Watchdog sampling configuration
///
/// # Example
///
/// ```toml
/// [watchdog]
/// sample_interval_ms = 5000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// How often the watchdog samples the rotation counter, in milliseconds
    /// Default: 5000
    pub sample_interval_ms: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 5000,
        }
    }
}
