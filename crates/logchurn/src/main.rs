//! logchurn - rotation-deadlock stress harness
//!
//! Hammers one shared rotating log sink from N producer threads while a
//! watchdog samples the rotation counter for liveness.
//!
//! # Usage
//!
//! ```bash
//! # Run with defaults (4 producers, 30s, sync sink, 100KB threshold)
//! logchurn
//!
//! # Run from a config file
//! logchurn --config configs/example.toml
//!
//! # Quick overrides
//! logchurn --producers 8 --threshold 4096 --mode async --duration 10
//! ```

mod harness;
mod producer;
mod report;
mod watchdog;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use logchurn_config::{Config, LogFormat};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Sink write path (CLI spelling)
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    /// Writers rotate inline and block behind a wedged rotation
    Sync,
    /// Writers enqueue and never block; only the consumer can wedge
    Async,
}

/// logchurn - rotation-deadlock stress harness
#[derive(Parser, Debug)]
#[command(name = "logchurn")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (error if specified but not found)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long)]
    log_level: Option<String>,

    /// Producer thread count. Overrides config file.
    #[arg(long)]
    producers: Option<usize>,

    /// Rotation threshold in bytes. Overrides config file.
    #[arg(long)]
    threshold: Option<u64>,

    /// Sink write path. Overrides config file.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Session duration in seconds. Overrides config file.
    #[arg(long)]
    duration: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(producers) = cli.producers {
        config.harness.producers = producers;
    }
    if let Some(threshold) = cli.threshold {
        config.sink.rotation_threshold_bytes = threshold;
    }
    if let Some(mode) = cli.mode {
        config.sink.mode = match mode {
            ModeArg::Sync => logchurn_config::SinkMode::Sync,
            ModeArg::Async => logchurn_config::SinkMode::Async,
        };
    }
    if let Some(duration) = cli.duration {
        config.harness.duration_secs = duration;
    }
    config.validate()?;

    let log_level = cli
        .log_level
        .unwrap_or_else(|| config.log.level.as_str().to_string());
    init_logging(&log_level, config.log.format)?;

    harness::run(&config)?;
    Ok(())
}

/// Load config from the given path, or defaults when none is specified
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::from_file(path)?),
        None => Ok(Config::default()),
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    match format {
        LogFormat::Console => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_thread_ids(false))
                .with(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .init();
        }
    }

    Ok(())
}
