//! The rotating sink
//!
//! One shared output resource, many writers. Writes are serialized through
//! an exclusive section; when the rotation policy fires, the transition
//! (close current file, invoke the hook, open the next file) runs inside
//! that same section, so other writers either wait for it to complete or
//! begin after it. There is no window where a writer observes "no current
//! file" as a steady state.
//!
//! # Rotation Transition
//!
//! ```text
//! 1. close current file
//! 2. RotationHook::on_close(closed)   <- unbounded; may never return
//! 3. open next file, reset byte/record counters
//! 4. rotation_count += 1 (Release)
//! ```
//!
//! Only after step 4 does the deferred record write proceed and the lock
//! release. The counter is read with an acquire load and never behind the
//! lock, so an external observer can still tell "no rotation needed" from
//! "sink wedged inside the hook" - the stall stays observable.
//!
//! # Sync vs Async
//!
//! The synchronous path rotates inline on the calling thread, so a wedged
//! hook propagates back to every producer. The asynchronous path enqueues
//! formatted lines on an unbounded queue consumed by a dedicated thread;
//! producers never block on rotation and only the consumer can wedge.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use bytes::BytesMut;
use crossbeam::channel::{self, Sender};
use parking_lot::Mutex;

use crate::common::{SinkError, SinkMetrics};
use crate::hook::{RotatedFile, RotationHook};
use crate::policy::RotationPolicy;
use crate::record::LogRecord;
use crate::storage::{StorageBackend, StorageHandle};

/// Write path selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkMode {
    /// `write` runs the policy check, rotation, and append inline while
    /// holding the exclusive section
    #[default]
    Sync,

    /// `write` enqueues the formatted record and returns immediately; a
    /// dedicated consumer thread performs rotation and appends
    Async,
}

/// Configuration for the rotating sink
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// File name prefix; files are named `{prefix}.{index:05}.log`
    pub file_prefix: String,

    /// Rotate before the write that would push the file past this many bytes
    pub threshold_bytes: u64,

    /// Flush to storage after every record
    pub auto_flush: bool,

    /// Synchronous or asynchronous write path
    pub mode: SinkMode,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            file_prefix: "app".into(),
            threshold_bytes: 100 * 1024,
            auto_flush: true,
            mode: SinkMode::Sync,
        }
    }
}

impl SinkConfig {
    /// Set the file name prefix
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Set the rotation threshold
    #[must_use]
    pub fn with_threshold_bytes(mut self, threshold_bytes: u64) -> Self {
        self.threshold_bytes = threshold_bytes;
        self
    }

    /// Select the write path
    #[must_use]
    pub fn with_mode(mut self, mode: SinkMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable per-record flushing
    #[must_use]
    pub fn with_auto_flush(mut self, auto_flush: bool) -> Self {
        self.auto_flush = auto_flush;
        self
    }
}

/// Sink state behind the exclusive section
///
/// `file` is an `Option` only so the handle can be moved out during the
/// close step of a transition; outside a transition it is always `Some`,
/// and nobody else can look while it is `None` because the transition runs
/// under the lock.
struct Core {
    backend: Box<dyn StorageBackend>,
    file: Option<Box<dyn StorageHandle>>,
    file_name: String,
    file_index: u64,
    bytes_since_open: u64,
    records_since_open: u64,
    policy: RotationPolicy,
    auto_flush: bool,
    prefix: String,
    hook: Arc<dyn RotationHook>,
    rotation_count: Arc<AtomicU64>,
    metrics: Arc<SinkMetrics>,
}

impl Core {
    fn new(
        backend: Box<dyn StorageBackend>,
        config: &SinkConfig,
        hook: Arc<dyn RotationHook>,
        rotation_count: Arc<AtomicU64>,
        metrics: Arc<SinkMetrics>,
    ) -> Result<Self, SinkError> {
        let mut core = Self {
            backend,
            file: None,
            file_name: String::new(),
            file_index: 0,
            bytes_since_open: 0,
            records_since_open: 0,
            policy: RotationPolicy::new(config.threshold_bytes),
            auto_flush: config.auto_flush,
            prefix: config.file_prefix.clone(),
            hook,
            rotation_count,
            metrics,
        };
        core.open_current()?;
        Ok(core)
    }

    fn file_name_for(prefix: &str, index: u64) -> String {
        format!("{prefix}.{index:05}.log")
    }

    fn open_current(&mut self) -> Result<(), SinkError> {
        let name = Self::file_name_for(&self.prefix, self.file_index);
        self.file = Some(self.backend.open(&name)?);
        self.file_name = name;
        self.bytes_since_open = 0;
        self.records_since_open = 0;
        Ok(())
    }

    /// Append one formatted line, rotating first if the policy fires
    fn append(&mut self, line: &[u8]) -> Result<(), SinkError> {
        if self.policy.should_rotate(self.bytes_since_open, line.len() as u64) {
            self.rotate()?;
        }

        let file = self.file.as_mut().ok_or(SinkError::Closed)?;
        if let Err(e) = file.write_all(line) {
            self.metrics.record_error();
            return Err(e.into());
        }

        self.bytes_since_open += line.len() as u64;
        self.records_since_open += 1;
        self.metrics.record_write(line.len() as u64);

        if self.auto_flush {
            let file = self.file.as_mut().ok_or(SinkError::Closed)?;
            if let Err(e) = file.flush_all() {
                self.metrics.record_error();
                return Err(e.into());
            }
        }

        Ok(())
    }

    /// The rotation transition. Runs entirely inside the exclusive section.
    fn rotate(&mut self) -> Result<(), SinkError> {
        let file = self.file.take().ok_or(SinkError::Closed)?;
        let closed = RotatedFile {
            name: self.file_name.clone(),
            index: self.file_index,
            bytes: self.bytes_since_open,
            records: self.records_since_open,
        };

        file.close()?;

        // The hook runs to completion before a replacement file exists. A
        // hook that never returns leaves every writer parked behind this
        // lock while the rotation counter stays at its pre-rotation value.
        self.hook.on_close(&closed);

        self.file_index += 1;
        self.open_current()?;
        let completed = self.rotation_count.fetch_add(1, Ordering::Release) + 1;

        tracing::debug!(
            closed = %closed.name,
            opened = %self.file_name,
            rotations = completed,
            "file rotation completed"
        );

        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if let Some(file) = self.file.take() {
            file.close()?;
        }
        Ok(())
    }
}

enum WritePath {
    Sync {
        core: Mutex<Core>,
    },
    Async {
        sender: Mutex<Option<Sender<BytesMut>>>,
        consumer: Mutex<Option<JoinHandle<()>>>,
    },
}

/// The shared rotating sink
///
/// Cheap to share via `Arc`; `write` and `rotation_count` are safe to call
/// from any thread.
pub struct RotatingSink {
    path: WritePath,
    rotation_count: Arc<AtomicU64>,
    metrics: Arc<SinkMetrics>,
}

impl RotatingSink {
    /// Create the sink and open its initial file
    pub fn open(
        config: SinkConfig,
        backend: Box<dyn StorageBackend>,
        hook: Arc<dyn RotationHook>,
    ) -> Result<Self, SinkError> {
        let rotation_count = Arc::new(AtomicU64::new(0));
        let metrics = Arc::new(SinkMetrics::new());

        let mut core = Core::new(
            backend,
            &config,
            hook,
            Arc::clone(&rotation_count),
            Arc::clone(&metrics),
        )?;

        let path = match config.mode {
            SinkMode::Sync => WritePath::Sync {
                core: Mutex::new(core),
            },
            SinkMode::Async => {
                let (sender, receiver) = channel::unbounded::<BytesMut>();
                let consumer = std::thread::Builder::new()
                    .name("sink-writer".into())
                    .spawn(move || {
                        while let Ok(line) = receiver.recv() {
                            if let Err(e) = core.append(&line) {
                                tracing::error!(error = %e, "async sink write failed");
                            }
                        }
                        // Channel closed: all senders dropped, queue drained
                        if let Err(e) = core.close() {
                            tracing::error!(error = %e, "async sink close failed");
                        }
                    })?;

                WritePath::Async {
                    sender: Mutex::new(Some(sender)),
                    consumer: Mutex::new(Some(consumer)),
                }
            }
        };

        Ok(Self {
            path,
            rotation_count,
            metrics,
        })
    }

    /// Write one record
    ///
    /// Sync mode: blocks for the exclusive section, rotates inline when the
    /// policy fires, and propagates storage failures. Async mode: enqueues
    /// and returns; storage failures surface through metrics and logs on
    /// the consumer side.
    pub fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        // Format outside the exclusive section
        let line = record.to_line();

        match &self.path {
            WritePath::Sync { core } => core.lock().append(line.as_bytes()),
            WritePath::Async { sender, .. } => {
                let guard = sender.lock();
                let sender = guard.as_ref().ok_or(SinkError::Closed)?;
                let mut buffer = BytesMut::with_capacity(line.len());
                buffer.extend_from_slice(line.as_bytes());
                sender.send(buffer).map_err(|_| SinkError::Closed)
            }
        }
    }

    /// Completed rotations since the sink was opened
    ///
    /// Lock-free acquire load. Does not touch the write path's exclusive
    /// section and stays readable while a rotation is wedged inside the
    /// hook.
    pub fn rotation_count(&self) -> u64 {
        self.rotation_count.load(Ordering::Acquire)
    }

    /// Write-path counters
    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Flush and close the sink
    ///
    /// Sync mode closes the current file under the lock. Async mode drops
    /// the queue sender and joins the consumer, which drains the queue and
    /// closes the file; if the consumer is wedged inside the hook this call
    /// hangs with it.
    pub fn close(&self) -> Result<(), SinkError> {
        match &self.path {
            WritePath::Sync { core } => core.lock().close(),
            WritePath::Async { sender, consumer } => {
                drop(sender.lock().take());
                if let Some(handle) = consumer.lock().take() {
                    handle.join().map_err(|_| SinkError::WriterPanicked)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "rotating_test.rs"]
mod rotating_test;
