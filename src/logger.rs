//! Logging setup.
//!
//! Records emitted through the `log` facade are routed by a `fern` dispatch to
//! stderr or a log file, and mirrored into an in-memory [`Logger`] so an
//! embedding application can show recent activity.

use crate::config::LoggingConfig;
use crate::constants::LOG_BUFFER_CAPACITY;
use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Shared in-memory log buffer that can be used across the application
#[derive(Clone)]
pub struct Logger {
    logs: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl Logger {
    pub fn new() -> Self {
        Self::with_capacity(LOG_BUFFER_CAPACITY)
    }

    /// Buffer keeping at most `capacity` entries; the oldest are dropped first.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            logs: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(LOG_BUFFER_CAPACITY)))),
            capacity: capacity.max(1),
        }
    }

    /// Add a log entry
    pub fn log(&self, message: String) {
        let timestamp = Utc::now().format("%H:%M:%S%.3f").to_string();
        let formatted_message = format!("[{}] {}", timestamp, message);

        if let Ok(mut logs) = self.logs.lock() {
            if logs.len() == self.capacity {
                logs.pop_front();
            }
            logs.push_back(formatted_message);
        }
    }

    /// Get all logs sorted by date (newest first)
    pub fn get_logs(&self) -> Vec<String> {
        if let Ok(logs) = self.logs.lock() {
            logs.iter().rev().cloned().collect()
        } else {
            Vec::new()
        }
    }

    /// Number of buffered entries
    pub fn len(&self) -> usize {
        self.logs.lock().map(|logs| logs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all logs
    pub fn clear(&self) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.clear();
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the dispatch described by `config`, mirroring records into `sink`.
///
/// The dispatch is returned unapplied so callers (and tests) can decide
/// whether to install it as the global logger.
pub fn build_dispatch(config: &LoggingConfig, sink: Logger) -> Result<fern::Dispatch> {
    let level = config.level_filter()?;

    let formatted = fern::Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "[{} {:<5} {}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            message
        ))
    });

    let formatted = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
            }
            let file = fern::log_file(path).with_context(|| format!("Failed to open log file: {}", path.display()))?;
            formatted.chain(file)
        }
        None => formatted.chain(std::io::stderr()),
    };

    let memory = fern::Dispatch::new().chain(fern::Output::call(move |record| {
        sink.log(format!("{} {}", record.level(), record.args()));
    }));

    // Query logging from the database layers is capped at warnings
    let quiet = level.min(log::LevelFilter::Warn);

    Ok(fern::Dispatch::new()
        .level(level)
        .level_for("sqlx", quiet)
        .level_for("sea_orm", quiet)
        .chain(formatted)
        .chain(memory))
}

/// Install the global logger and return the in-memory buffer it feeds.
///
/// # Errors
/// Returns an error if the level is invalid, the log file cannot be opened,
/// or a global logger has already been installed.
pub fn init(config: &LoggingConfig) -> Result<Logger> {
    let sink = Logger::new();
    build_dispatch(config, sink.clone())?
        .apply()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;
    Ok(sink)
}
