//! Console banner and end-of-run report

use std::time::Duration;

use logchurn_config::Config;

const LINE_WIDTH: usize = 52;

/// Final tallies for one session
#[derive(Debug, Clone, Copy)]
pub struct Outcome {
    /// Records submitted across all producers
    pub submitted: u64,

    /// Records the sink appended to storage
    pub written: u64,

    /// Bytes the sink appended to storage
    pub bytes: u64,

    /// Completed rotations
    pub rotations: u64,

    /// Progress events the watchdog emitted
    pub progress_events: usize,

    /// Wall-clock session length
    pub elapsed: Duration,
}

/// Print the startup banner describing the configuration under test
pub fn print_banner(config: &Config) {
    let line = "─".repeat(LINE_WIDTH);
    println!("{line}");
    println!("logchurn | rotation-deadlock stress harness");
    println!("{line}");
    println!("  producers        | {}", config.harness.producers);
    println!("  session          | {}s", config.harness.duration_secs);
    println!(
        "  rotation at      | {}",
        format_bytes(config.sink.rotation_threshold_bytes)
    );
    println!("  sink mode        | {}", config.sink.mode.as_str());
    println!(
        "  auto flush       | {}",
        if config.sink.auto_flush { "on" } else { "off" }
    );
    println!(
        "  watchdog period  | {}ms",
        config.watchdog.sample_interval_ms
    );
    println!("  output           | {}", config.sink.directory.display());
    println!("{line}");
}

/// Print the end-of-run summary line
pub fn print_summary(outcome: &Outcome) {
    let secs = outcome.elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        outcome.written as f64 / secs
    } else {
        0.0
    };
    println!(
        "───────── {} submitted | {} written | {} | {} rotations | {} progress events | {:.2}s | {:.0} records/s",
        outcome.submitted,
        outcome.written,
        format_bytes(outcome.bytes),
        outcome.rotations,
        outcome.progress_events,
        secs,
        rate,
    );
}

/// Format bytes as human-readable (auto-scale)
fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1} GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1} MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1} KB", bytes as f64 / 1_000.0)
    } else {
        format!("{bytes} B")
    }
}
