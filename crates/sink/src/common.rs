//! Shared sink types: errors and metrics

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

/// Errors surfaced by the sink's write path
///
/// Storage failures are propagated, not retried. A wedged rotation is not
/// representable here at all - the call simply never returns.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The storage collaborator failed
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sink was closed, or its current file was lost to an earlier
    /// storage failure mid-transition
    #[error("sink is closed")]
    Closed,

    /// The async consumer thread panicked before shutdown completed
    #[error("sink writer thread panicked")]
    WriterPanicked,
}

/// Write-path counters
///
/// Plain in-process atomics; read by the end-of-run report and by tests.
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Records appended to storage
    records_written: AtomicU64,

    /// Bytes appended to storage
    bytes_written: AtomicU64,

    /// Storage write/flush failures
    write_errors: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            records_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    /// Record a successfully appended record
    #[inline]
    pub fn record_write(&self, bytes: u64) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a storage failure
    #[inline]
    pub fn record_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> SinkMetricsSnapshot {
        SinkMetricsSnapshot {
            records_written: self.records_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of [`SinkMetrics`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SinkMetricsSnapshot {
    pub records_written: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
}
