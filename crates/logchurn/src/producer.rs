//! Producer worker threads
//!
//! Each producer runs on its own OS thread and hammers the shared sink with
//! a steady stream of records: one info record per cycle, plus a debug
//! checkpoint every `debug_every` cycles and a warning every `warn_every`
//! cycles to diversify the load shape. The stop flag is polled once per
//! cycle - the only cancellation point. A producer parked inside a wedged
//! `write` stays parked; there is no escape hatch here.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use logchurn_sink::{LogRecord, RotatingSink, SequenceGenerator, Severity};

/// Pacing and cadence for a producer thread
#[derive(Debug, Clone)]
pub struct ProducerOptions {
    /// Fixed delay between cycles
    pub write_delay: Duration,

    /// Emit an extra debug record every Nth cycle
    pub debug_every: u64,

    /// Emit an extra warning record every Nth cycle
    pub warn_every: u64,
}

/// A running producer thread
pub struct ProducerHandle {
    submitted: Arc<AtomicU64>,
    handle: thread::JoinHandle<()>,
}

impl ProducerHandle {
    /// Shared counter of records this producer has submitted
    ///
    /// Stops advancing the moment the producer parks inside a wedged
    /// `write` - the per-thread liveness signal.
    pub fn submitted(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.submitted)
    }

    /// Wait for the producer thread to exit
    ///
    /// Hangs forever if the producer is stuck inside a wedged rotation.
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

/// Spawn one producer thread writing to `sink` until `stop` is set
pub fn spawn(
    worker: usize,
    sink: Arc<RotatingSink>,
    seq: Arc<SequenceGenerator>,
    stop: Arc<AtomicBool>,
    options: ProducerOptions,
) -> io::Result<ProducerHandle> {
    let submitted = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&submitted);

    let handle = thread::Builder::new()
        .name(format!("producer-{worker}"))
        .spawn(move || run(worker, &sink, &seq, &stop, &options, &counter))?;

    Ok(ProducerHandle { submitted, handle })
}

fn run(
    worker: usize,
    sink: &RotatingSink,
    seq: &SequenceGenerator,
    stop: &AtomicBool,
    options: &ProducerOptions,
    submitted: &AtomicU64,
) {
    let mut cycle: u64 = 0;
    let mut seen_rotations = sink.rotation_count();

    while !stop.load(Ordering::Relaxed) {
        cycle += 1;

        let message = format!(
            "[worker-{worker}] message #{cycle} - steady write pressure with enough \
             payload to push the active file toward its rotation threshold"
        );
        submit(sink, seq, worker, Severity::Info, message, submitted);

        if cycle % options.debug_every == 0 {
            let message = format!("[worker-{worker}] checkpoint at message {cycle}");
            submit(sink, seq, worker, Severity::Debug, message, submitted);
        }

        if cycle % options.warn_every == 0 {
            let message = format!("[worker-{worker}] processed {cycle} messages");
            submit(sink, seq, worker, Severity::Warning, message, submitted);
        }

        let rotations = sink.rotation_count();
        if rotations != seen_rotations {
            tracing::debug!(worker, rotations, "observed rotation");
            seen_rotations = rotations;
        }

        thread::sleep(options.write_delay);
    }

    tracing::debug!(worker, cycles = cycle, "producer stopped");
}

fn submit(
    sink: &RotatingSink,
    seq: &SequenceGenerator,
    worker: usize,
    severity: Severity,
    message: String,
    submitted: &AtomicU64,
) {
    let record = LogRecord::new(seq.next(), severity, worker, message);
    match sink.write(&record) {
        Ok(()) => {
            submitted.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            tracing::warn!(worker, error = %e, "write failed");
        }
    }
}

#[cfg(test)]
#[path = "producer_test.rs"]
mod producer_test;
