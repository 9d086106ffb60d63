//! Harness orchestration
//!
//! Wires the rotating sink, the producer fleet, and the watchdog together
//! for one bounded session. Shutdown is cooperative: producers get their
//! stop flag first and are joined before the sink's final close, then the
//! watchdog is stopped and its event stream drained for the report. A
//! wedged rotation transition makes the producer joins hang; no timeout
//! masks that.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam::channel::unbounded;

use logchurn_config::Config;
use logchurn_sink::{
    FileBackend, RotatedFile, RotatingSink, SequenceGenerator, SinkConfig, SinkMode,
};

use crate::producer::{self, ProducerOptions};
use crate::report::{self, Outcome};
use crate::watchdog::{self, ProgressEvent};

/// Run one stress session and report the outcome
pub fn run(config: &Config) -> Result<Outcome> {
    report::print_banner(config);

    let sink = Arc::new(open_sink(config)?);
    let seq = Arc::new(SequenceGenerator::new());
    let producer_stop = Arc::new(AtomicBool::new(false));
    let watchdog_stop = Arc::new(AtomicBool::new(false));

    let (events_tx, events_rx) = unbounded::<ProgressEvent>();
    let watchdog = {
        let sink = Arc::clone(&sink);
        watchdog::spawn(
            Duration::from_millis(config.watchdog.sample_interval_ms),
            Arc::clone(&watchdog_stop),
            move || sink.rotation_count(),
            events_tx,
        )?
    };

    let options = ProducerOptions {
        write_delay: Duration::from_micros(config.harness.write_delay_us),
        debug_every: config.harness.debug_every,
        warn_every: config.harness.warn_every,
    };

    let producers: Vec<_> = (0..config.harness.producers)
        .map(|worker| {
            producer::spawn(
                worker,
                Arc::clone(&sink),
                Arc::clone(&seq),
                Arc::clone(&producer_stop),
                options.clone(),
            )
        })
        .collect::<std::io::Result<_>>()?;

    let started = Instant::now();
    tracing::info!(
        producers = config.harness.producers,
        duration_secs = config.harness.duration_secs,
        mode = config.sink.mode.as_str(),
        "session running"
    );

    thread::sleep(Duration::from_secs(config.harness.duration_secs));

    producer_stop.store(true, Ordering::Relaxed);
    let counters: Vec<Arc<AtomicU64>> = producers.iter().map(|p| p.submitted()).collect();
    for producer in producers {
        // Hangs if a rotation transition is wedged
        producer.join();
    }

    sink.close()?;

    watchdog_stop.store(true, Ordering::Relaxed);
    let _ = watchdog.join();

    let progress_events: Vec<ProgressEvent> = events_rx.try_iter().collect();
    if let Some(last) = progress_events.last() {
        let longest_wait = progress_events
            .iter()
            .map(|e| e.since_last)
            .max()
            .unwrap_or_default();
        tracing::debug!(
            last_progress_at = %last.at,
            longest_wait_ms = longest_wait.as_millis() as u64,
            "progress event stream drained"
        );
    }
    let metrics = sink.metrics().snapshot();
    let outcome = Outcome {
        submitted: counters.iter().map(|c| c.load(Ordering::Relaxed)).sum(),
        written: metrics.records_written,
        bytes: metrics.bytes_written,
        rotations: sink.rotation_count(),
        progress_events: progress_events.len(),
        elapsed: started.elapsed(),
    };

    tracing::info!(
        submitted = outcome.submitted,
        written = outcome.written,
        rotations = outcome.rotations,
        write_errors = metrics.write_errors,
        "session complete"
    );
    report::print_summary(&outcome);

    Ok(outcome)
}

fn open_sink(config: &Config) -> Result<RotatingSink> {
    let backend = FileBackend::new(&config.sink.directory);

    let hook = |closed: &RotatedFile| {
        tracing::info!(
            file = %closed.name,
            bytes = closed.bytes,
            records = closed.records,
            "rotation detected"
        );
    };

    let sink_config = SinkConfig::default()
        .with_prefix(config.sink.file_prefix.clone())
        .with_threshold_bytes(config.sink.rotation_threshold_bytes)
        .with_auto_flush(config.sink.auto_flush)
        .with_mode(match config.sink.mode {
            logchurn_config::SinkMode::Sync => SinkMode::Sync,
            logchurn_config::SinkMode::Async => SinkMode::Async,
        });

    Ok(RotatingSink::open(
        sink_config,
        Box::new(backend),
        Arc::new(hook),
    )?)
}
