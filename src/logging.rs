//! Logging initialization.
//!
//! The terminal belongs to the UI, so logs go to
//! `<state dir>/logs/social-support-{datetime}.log`.

use crate::config::AppConfig;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Result of logging initialization
pub struct LoggingHandle {
    /// Guard that must be kept alive for the duration of the program.
    /// When dropped, buffered logs are flushed.
    pub _guard: WorkerGuard,

    pub log_file_path: PathBuf,
}

/// File name for a log started at `started`.
pub fn log_file_name(started: DateTime<Utc>) -> String {
    format!("social-support-{}.log", started.format("%Y%m%dT%H%M%SZ"))
}

/// Level filter directive: `--debug` wins, then `RUST_LOG`, then the
/// configured level.
pub fn filter_directive(config: &AppConfig, debug_override: bool, rust_log: Option<String>) -> String {
    if debug_override {
        return "debug".to_string();
    }
    rust_log.unwrap_or_else(|| config.log_level.clone())
}

/// Initialize file logging.
///
/// # Arguments
/// * `config` - Application configuration
/// * `debug_override` - Forces the "debug" level (from `--debug`)
///
/// # Returns
/// A `LoggingHandle` that must be kept alive for the duration of the program.
pub fn init_logging(config: &AppConfig, debug_override: bool) -> Result<LoggingHandle> {
    let directive = filter_directive(config, debug_override, std::env::var("RUST_LOG").ok());
    let filter = tracing_subscriber::EnvFilter::try_new(&directive)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let logs_dir = config.logs_path();
    std::fs::create_dir_all(&logs_dir)?;
    let (log_file_path, guard) = file_writer(&logs_dir, filter)?;

    tracing::info!(path = %log_file_path.display(), level = %directive, "logging started");
    Ok(LoggingHandle {
        _guard: guard,
        log_file_path,
    })
}

fn file_writer(
    logs_dir: &Path,
    filter: tracing_subscriber::EnvFilter,
) -> Result<(PathBuf, WorkerGuard)> {
    let log_filename = log_file_name(Utc::now());
    let log_file_path = logs_dir.join(&log_filename);

    let file_appender = tracing_appender::rolling::never(logs_dir, &log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .try_init()?;

    Ok((log_file_path, guard))
}
