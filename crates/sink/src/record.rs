//! Log records, severity levels, and sequence id allocation
//!
//! A [`LogRecord`] is the immutable unit of work handed to the sink. It is
//! owned by the producer that built it; the sink borrows it for formatting
//! and never retains it.
//!
//! # Line Format
//!
//! ```text
//! [2025-01-15T10:30:45.123Z] [info] [17] [TID:3] message text
//! ```

use std::fmt;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Severity of a log record, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug checkpoints
    Debug,
    /// Normal operation
    Info,
    /// Something noteworthy
    Warning,
    /// Something broken
    Error,
}

impl Severity {
    /// Lowercase name as it appears in formatted lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide sequence id allocator
///
/// Hands out unique, contiguous ids under concurrent access from any number
/// of producer threads. Ids are never reused and never skipped; any gap or
/// duplicate observed downstream is a bug in the caller, not here.
#[derive(Debug)]
pub struct SequenceGenerator {
    next: AtomicU64,
}

impl SequenceGenerator {
    /// Create a generator starting at 0
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a generator starting at the given id
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Allocate the next sequence id
    #[inline]
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable unit of log output
#[derive(Debug, Clone)]
pub struct LogRecord {
    seq: u64,
    severity: Severity,
    worker: usize,
    message: String,
    timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// Create a record, capturing the current instant as its timestamp
    pub fn new(seq: u64, severity: Severity, worker: usize, message: String) -> Self {
        Self {
            seq,
            severity,
            worker,
            message,
            timestamp: Utc::now(),
        }
    }

    /// Sequence id assigned at submission time
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Record severity
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Opaque id of the producing thread
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Message text
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Capture-time instant
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Format this record into `buf` as a single newline-terminated line
    pub fn format_line(&self, buf: &mut String) {
        buf.clear();
        let _ = write!(
            buf,
            "[{}] [{}] [{}] [TID:{}] {}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.severity,
            self.seq,
            self.worker,
            self.message,
        );
        buf.push('\n');
    }

    /// Format this record as a fresh line
    pub fn to_line(&self) -> String {
        let mut buf = String::with_capacity(64 + self.message.len());
        self.format_line(&mut buf);
        buf
    }
}
