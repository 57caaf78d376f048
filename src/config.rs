//! Configuration management for repolists
//!
//! This module handles loading, parsing, and validation of configuration files.

use crate::constants::{
    APP_NAME, CONFIG_FILE_NAME, DATABASE_FILE_NAME, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_OPERATION_TIMEOUT_SECS, LOCAL_CONFIG_FILE_NAME, MAX_CONNECTIONS_LIMIT, MAX_OPERATION_TIMEOUT_SECS,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub lists: ListsConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SeaORM connection URL, e.g. "sqlite://path/to/repolists.db?mode=rwc"
    /// or "sqlite::memory:"
    pub url: String,
    /// Upper bound on pooled connections
    pub max_connections: u32,
}

/// List store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListsConfig {
    /// Per-operation timeout in seconds (0 = disabled)
    pub operation_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Level filter: "off", "error", "warn", "info", "debug" or "trace"
    pub level: String,
    /// Log file path. Logs go to stderr when unset.
    pub file: Option<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self {
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Database file under the user's data directory, falling back to the
/// working directory when no data directory is known.
fn default_database_url() -> String {
    let path = dirs::data_dir()
        .map(|dir| dir.join(APP_NAME).join(DATABASE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_NAME));
    format!("sqlite://{}?mode=rwc", path.display())
}

impl ListsConfig {
    /// Timeout to apply to store operations, if any.
    pub fn operation_timeout(&self) -> Option<Duration> {
        if self.operation_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.operation_timeout_secs))
        }
    }
}

impl LoggingConfig {
    /// Effective level filter. Disabled logging maps to `Off`.
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        if !self.enabled {
            return Ok(log::LevelFilter::Off);
        }
        log::LevelFilter::from_str(&self.level)
            .map_err(|e| anyhow::anyhow!("Invalid logging level '{}': {}", self.level, e))
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join(APP_NAME).join(CONFIG_FILE_NAME);
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            anyhow::bail!("database url cannot be empty");
        }

        if self.database.max_connections == 0 || self.database.max_connections > MAX_CONNECTIONS_LIMIT {
            anyhow::bail!(
                "max_connections must be between 1 and {}, got {}",
                MAX_CONNECTIONS_LIMIT,
                self.database.max_connections
            );
        }

        if self.lists.operation_timeout_secs > MAX_OPERATION_TIMEOUT_SECS {
            anyhow::bail!(
                "operation_timeout_secs cannot exceed {} (1 hour)",
                MAX_OPERATION_TIMEOUT_SECS
            );
        }

        // Checked even when logging is disabled
        if let Err(e) = log::LevelFilter::from_str(&self.logging.level) {
            anyhow::bail!("Invalid logging level '{}': {}", self.logging.level, e);
        }

        Ok(())
    }

    /// Generate a commented default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let section = |name: &str, comment: &str, body: Result<String, toml::ser::Error>| -> Result<String> {
            let body = body.with_context(|| format!("Failed to serialize [{}] section", name))?;
            Ok(format!("{}[{}]\n{}\n", comment, name, body))
        };

        let mut full_content = format!(
            "# repolists Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format("%Y-%m-%d")
        );
        full_content += &section(
            "database",
            "# url: SQLite connection URL, e.g. \"sqlite://path/to/repolists.db?mode=rwc\"\n\
             # max_connections: pooled connections, 1 to 64\n",
            toml::to_string_pretty(&config.database),
        )?;
        full_content += &section(
            "lists",
            "# operation_timeout_secs: limit for each store operation, 0 disables it\n",
            toml::to_string_pretty(&config.lists),
        )?;
        full_content += &section(
            "logging",
            "# enabled: turn logging on\n\
             # level: off, error, warn, info, debug or trace\n\
             # file: log file path; logs go to stderr when unset\n",
            toml::to_string_pretty(&config.logging),
        )?;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join(APP_NAME))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join(CONFIG_FILE_NAME))
    }
}
