//! logchurn - Rotating sink
//!
//! A single shared, size-bounded, append-only log sink built to be hammered
//! by many writer threads at once. When the configured byte threshold would
//! be crossed, the sink closes the current file, invokes a user-supplied
//! rotation hook, and opens the next file - all inside its exclusive
//! section, so the transition is atomic with respect to every other writer.
//!
//! # Architecture
//!
//! ```text
//! [writer threads] --write()--> [Mutex<Core>] --policy--> append
//!                                     |  (threshold crossed)
//!                                     v
//!                         close -> RotationHook -> open next
//!                                     |
//!                                     v
//!                          rotation_count (AtomicU64)
//!                                     ^
//!                  [watchdog] reads lock-free, never touches the mutex
//! ```
//!
//! The hook runs synchronously while the lock is held. A hook that never
//! returns wedges every writer behind the sink, while the rotation counter
//! stays readable from outside, so the stall is observable.
//!
//! # Modes
//!
//! | Mode | `write()` | Who can wedge |
//! |------|-----------|---------------|
//! | `Sync` | blocks for the exclusive section, may rotate inline | every writer |
//! | `Async` | enqueues to an unbounded queue, returns immediately | the consumer thread only |
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use logchurn_sink::{
//!     FileBackend, LogRecord, NoopHook, RotatingSink, SequenceGenerator,
//!     Severity, SinkConfig,
//! };
//!
//! let config = SinkConfig::default().with_threshold_bytes(100 * 1024);
//! let sink = RotatingSink::open(config, Box::new(FileBackend::new("logs")), Arc::new(NoopHook))?;
//!
//! let seq = SequenceGenerator::new();
//! let record = LogRecord::new(seq.next(), Severity::Info, 0, "hello".into());
//! sink.write(&record)?;
//! sink.close()?;
//! ```

/// Shared sink types (errors, metrics)
mod common;

/// Rotation hooks invoked when a file is closed
pub mod hook;

/// Size-based rotation decision
pub mod policy;

/// Log records, severity levels, sequence id allocation
pub mod record;

/// The rotating sink itself (sync and async write paths)
pub mod rotating;

/// Pluggable storage backends
pub mod storage;

pub use common::{SinkError, SinkMetrics, SinkMetricsSnapshot};
pub use hook::{NoopHook, RotatedFile, RotationHook};
pub use policy::RotationPolicy;
pub use record::{LogRecord, SequenceGenerator, Severity};
pub use rotating::{RotatingSink, SinkConfig, SinkMode};
pub use storage::{DEFAULT_BUFFER_SIZE, FileBackend, StorageBackend, StorageHandle};
