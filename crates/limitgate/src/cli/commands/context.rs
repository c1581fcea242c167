//! Shared setup for command handlers.
//!
//! Every command that touches limits or history goes through a
//! [`CommandContext`]: it locates the configuration, validates it, resolves
//! the database path and opens the `SQLite` history.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use limitgate_core::config::Config;
use limitgate_core::config_loader::{expand_config_paths, ConfigLoader};
use limitgate_core::error::{ConfigError, HistoryError};
use limitgate_core::types::{Amount, Transfer, TransferId};
use limitgate_policy::history::{SqliteHistory, SqliteOptions};
use limitgate_policy::registry::LimitRegistry;

/// Failure to read a transfer argument.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The argument named a file that could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The JSON did not describe a transfer.
    #[error("Invalid transfer JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The transfer amount was below zero.
    #[error("Invalid amount {amount} for transfer {id}: must not be negative")]
    NegativeAmount {
        /// Transfer id.
        id: TransferId,
        /// Submitted amount.
        amount: Amount,
    },
}

/// Locates configuration and opens the resources commands need.
#[derive(Debug, Clone)]
pub struct CommandContext {
    loader: ConfigLoader,
}

impl CommandContext {
    /// Uses `config_file` if given, otherwise `~/.limitgate/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `config_file` is not named
    /// `config.toml`, or [`ConfigError::NoHomeDirectory`] if no file is
    /// given and the home directory is unknown.
    pub fn resolve(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let loader = match config_file {
            Some(path) => ConfigLoader::for_config_file(path).ok_or_else(|| {
                ConfigError::invalid_value("--config", path.display().to_string())
            })?,
            None => ConfigLoader::new()?,
        };
        Ok(Self { loader })
    }

    /// Wraps an existing loader.
    #[must_use]
    pub const fn with_loader(loader: ConfigLoader) -> Self {
        Self { loader }
    }

    /// Returns the configuration loader.
    #[must_use]
    pub const fn loader(&self) -> &ConfigLoader {
        &self.loader
    }

    /// Loads and validates the configuration, resolving the database path.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or a
    /// value is missing or out of range.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = self.loader.load()?;
        config.validate()?;
        expand_config_paths(&mut config, self.loader.base_dir())?;
        Ok(config)
    }

    /// Builds the limit registry described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a rule cannot be built.
    pub fn registry(config: &Config) -> Result<LimitRegistry, ConfigError> {
        LimitRegistry::from_config(&config.limits)
    }

    /// Opens the history database, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Storage`] if the directory or database
    /// cannot be created.
    pub fn open_history(config: &Config) -> Result<SqliteHistory, HistoryError> {
        let path = Path::new(&config.history.database_path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    HistoryError::storage(format!(
                        "failed to create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let options = SqliteOptions {
            pool_size: config.history.pool_size,
            connection_timeout: Duration::from_secs(config.history.connection_timeout_secs),
        };
        tracing::debug!(path = %path.display(), pool_size = options.pool_size, "Opening history database");
        SqliteHistory::with_options(path, options)
    }
}

/// Parses a transfer given inline as JSON or as a path to a JSON file.
///
/// # Errors
///
/// Returns [`InputError`] if the file cannot be read, the JSON is invalid or
/// the amount is negative.
pub fn read_transfer(input: &str) -> Result<Transfer, InputError> {
    let trimmed = input.trim_start();
    let transfer: Transfer = if trimmed.starts_with('{') {
        serde_json::from_str(trimmed)?
    } else {
        let path = PathBuf::from(input);
        let content =
            fs::read_to_string(&path).map_err(|source| InputError::Io { path, source })?;
        serde_json::from_str(&content)?
    };

    if transfer.amount < 0 {
        return Err(InputError::NegativeAmount {
            id: transfer.id,
            amount: transfer.amount,
        });
    }
    Ok(transfer)
}
