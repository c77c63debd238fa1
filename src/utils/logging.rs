//! Logging system initialization
//!
//! Sets up tracing-based logging with file output to `<data dir>/gameshelf.log`
//! and rotation on startup keeping the previous sessions' logs.

use crate::error::{GameShelfError, Result, StringError};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt};

/// Base name of the active log file
pub const LOG_FILE_NAME: &str = "gameshelf.log";

/// Maximum number of historical log files to keep (gameshelf.log.1 through gameshelf.log.9)
const MAX_LOG_FILES: u8 = 9;

/// Initialize the logging system
///
/// `default_level` applies unless `RUST_LOG` is set.
pub fn init_logging(log_dir: &Path, default_level: &str) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    rotate_logs_on_startup(&log_dir.join(LOG_FILE_NAME))?;

    // Rotation happens above, once per session
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("gameshelf")
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| GameShelfError::ConfigError(Box::new(e)))?;

    let subscriber = fmt()
        .with_writer(file_appender)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| GameShelfError::ConfigError(Box::new(e)))?;

    tracing::info!("GameShelf v{} started", env!("CARGO_PKG_VERSION"));

    Ok(())
}

/// Shift `name.log` -> `name.log.1` -> ... -> `name.log.9`, dropping the oldest
///
/// A fresh log file is created by the appender afterwards.
fn rotate_logs_on_startup(log_path: &Path) -> Result<()> {
    if !log_path.exists() {
        return Ok(());
    }

    let log_dir = log_path
        .parent()
        .ok_or_else(|| GameShelfError::ConfigError(StringError::new("Invalid log path")))?;
    let log_name = log_path
        .file_name()
        .ok_or_else(|| GameShelfError::ConfigError(StringError::new("Invalid log filename")))?
        .to_string_lossy();

    let oldest_log = log_dir.join(format!("{log_name}.{MAX_LOG_FILES}"));
    if oldest_log.exists() {
        std::fs::remove_file(&oldest_log)?;
    }

    for i in (1..MAX_LOG_FILES).rev() {
        let current_log = log_dir.join(format!("{log_name}.{i}"));
        if current_log.exists() {
            std::fs::rename(&current_log, log_dir.join(format!("{log_name}.{}", i + 1)))?;
        }
    }

    std::fs::rename(log_path, log_dir.join(format!("{log_name}.1")))?;

    Ok(())
}
