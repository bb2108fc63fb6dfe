// File: maintainer/src/logging.rs
//! Console and rolling-file log output.

use crate::config::LoggingConfig;
use anyhow::{anyhow, Result};
use std::fs;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` plus the agent's default directives
pub fn env_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("maintainer=info".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?))
}

/// Daily-rotated appender under `config.directory`, or `None` when the file
/// sink is switched off.
pub fn rolling_file(config: &LoggingConfig) -> Result<Option<RollingFileAppender>> {
    if !config.file_enabled {
        return Ok(None);
    }

    fs::create_dir_all(&config.directory).map_err(|e| {
        anyhow!(
            "Failed to create log directory {}: {}",
            config.directory.display(),
            e
        )
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.file_prefix)
        .filename_suffix("log")
        .max_log_files(config.max_files)
        .build(&config.directory)
        .map_err(|e| anyhow!("Failed to open log file: {}", e))?;

    Ok(Some(appender))
}

/// Install the global subscriber: stdout always, plus the rolling file when
/// it can be opened. The returned guard flushes the file writer on drop and
/// must live as long as the process logs.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let (file_layer, guard, file_error) = match rolling_file(config) {
        Ok(Some(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard), None)
        }
        Ok(None) => (None, None, None),
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(env_filter()?)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()?;

    if let Some(e) = file_error {
        warn!("Logging to console only: {}", e);
    }
    Ok(guard)
}
