//! Harness session settings
//!
//! Controls how many producer threads run, for how long, and at what rate.

use serde::Deserialize;

/// Settings for the producer fleet and session length
///
/// # Example
///
/// ```toml
/// [harness]
/// producers = 4
/// duration_secs = 30
/// write_delay_us = 100
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Number of producer worker threads
    /// Default: 4
    pub producers: usize,

    /// Session length in seconds
    /// Default: 30
    pub duration_secs: u64,

    /// Fixed delay between producer cycles, in microseconds
    /// Default: 100
    pub write_delay_us: u64,

    /// Emit an extra debug checkpoint record every Nth cycle
    /// Default: 10
    pub debug_every: u64,

    /// Emit an extra warning record every Nth cycle
    /// Default: 100
    pub warn_every: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            producers: 4,
            duration_secs: 30,
            write_delay_us: 100,
            debug_every: 10,
            warn_every: 100,
        }
    }
}
