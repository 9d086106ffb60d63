//! Liveness watchdog
//!
//! An independent timer-driven observer. On a fixed period it samples the
//! sink's rotation counter through an injected closure and, when the count
//! advanced since the previous sample, emits a [`ProgressEvent`] on its
//! channel and logs it. It never touches the sink's write lock, so a
//! rotation wedged inside the hook shows up here as *silence* - the
//! watchdog keeps sampling a frozen counter - rather than as a blocked
//! observer.
//!
//! The watchdog does not judge staleness itself: whether "no progress for
//! N seconds" means a stall depends on write rate and threshold, which the
//! consumer of the event stream knows and this module does not.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossbeam::channel::Sender;

/// One observed step of forward progress
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// When the progress was observed
    pub at: DateTime<Utc>,

    /// Rotation count at observation time
    pub rotation_count: u64,

    /// Elapsed since the previous progress observation (or watchdog start)
    pub since_last: Duration,
}

/// Spawn the watchdog thread
///
/// Samples `rotations()` every `interval` until `stop` is set, sending a
/// [`ProgressEvent`] whenever the count advanced. The stop flag is polled
/// once per cycle.
pub fn spawn<F>(
    interval: Duration,
    stop: Arc<AtomicBool>,
    rotations: F,
    events: Sender<ProgressEvent>,
) -> io::Result<thread::JoinHandle<()>>
where
    F: Fn() -> u64 + Send + 'static,
{
    thread::Builder::new()
        .name("watchdog".into())
        .spawn(move || run(interval, &stop, &rotations, &events))
}

fn run(
    interval: Duration,
    stop: &AtomicBool,
    rotations: &dyn Fn() -> u64,
    events: &Sender<ProgressEvent>,
) {
    let mut last_count = rotations();
    let mut last_progress = Instant::now();

    while !stop.load(Ordering::Relaxed) {
        thread::sleep(interval);
        if stop.load(Ordering::Relaxed) {
            break;
        }

        let count = rotations();
        if count > last_count {
            let since_last = last_progress.elapsed();
            tracing::info!(
                rotations = count,
                waited_ms = since_last.as_millis() as u64,
                "rotation progress"
            );
            let _ = events.send(ProgressEvent {
                at: Utc::now(),
                rotation_count: count,
                since_last,
            });
            last_count = count;
            last_progress = Instant::now();
        }
    }

    tracing::debug!(rotations = last_count, "watchdog stopped");
}

#[cfg(test)]
#[path = "watchdog_test.rs"]
mod watchdog_test;
