//! Telemetry and logging initialization.
//!
//! Sets up structured logging with tracing and optional JSON output.

use crate::config::LoggingConfig;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// The guard flushes the file writer on drop and must outlive the program.
static LOG_GUARD: Mutex<Option<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(None);

/// Initialize telemetry from the `[logging]` section.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    match &config.file {
        Some(file) => init_telemetry_with_file(&config.level, file),
        None => init_telemetry(&config.level, config.json),
    }
}

/// Initialize telemetry (logging and tracing).
pub fn init_telemetry(log_level: &str, json_format: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(log_level)?;

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .try_init()?;
    }

    Ok(())
}

/// Initialize telemetry with daily-rotated JSON file output.
pub fn init_telemetry_with_file(log_level: &str, log_file: &Path) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(log_level)?;

    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = log_file
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid log file '{}'", log_file.display()))?;
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::daily(dir, prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(non_blocking))
        .try_init()?;

    if let Ok(mut g) = LOG_GUARD.lock() {
        *g = Some(guard);
    }

    Ok(())
}
