//! Sink settings
//!
//! Where log files go, when they rotate, and which write path the sink uses.

use std::path::PathBuf;

use serde::Deserialize;

/// Sink write path
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SinkMode {
    /// Writers rotate inline; a wedged rotation blocks every producer (default)
    #[default]
    Sync,
    /// Writers enqueue and return; only the consumer thread can wedge
    Async,
}

impl SinkMode {
    /// Lowercase name as written in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Async => "async",
        }
    }
}

/// Sink configuration
///
/// # Example
///
/// ```toml
/// [sink]
/// directory = "logs"
/// file_prefix = "app"
/// rotation_threshold_bytes = 102400
/// mode = "sync"
/// auto_flush = true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Output directory for log files
    /// Default: "logs"
    pub directory: PathBuf,

    /// File name prefix; files are named `{prefix}.{index:05}.log`
    /// Default: "app"
    pub file_prefix: String,

    /// Rotate before the write that would push the file past this many bytes
    /// Default: 102400 (100KB)
    pub rotation_threshold_bytes: u64,

    /// Write path (sync, async)
    /// Default: sync
    pub mode: SinkMode,

    /// Flush to storage after every record
    /// Default: true
    pub auto_flush: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_prefix: "app".into(),
            rotation_threshold_bytes: 100 * 1024,
            mode: SinkMode::Sync,
            auto_flush: true,
        }
    }
}
