//! `limitgate status`: where things live and how much is stored.

use std::fmt;
use std::path::PathBuf;

use limitgate_core::error::{ConfigError, HistoryError};
use limitgate_core::types::AdminTier;
use limitgate_core::Decimal;

use super::context::CommandContext;

// ============================================================================
// StatusError
// ============================================================================

/// Errors from `limitgate status`.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// The configuration could not be loaded.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    /// The history database could not be read.
    #[error("History error: {0}")]
    History(#[from] HistoryError),
}

// ============================================================================
// StatusReport
// ============================================================================

/// Snapshot printed by `limitgate status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Configuration file path.
    pub config_path: PathBuf,
    /// Whether the configuration file exists.
    pub initialized: bool,
    /// Resolved history database path.
    pub database_path: PathBuf,
    /// Stored transfers, if the database exists.
    pub transfer_count: Option<u64>,
    /// Number of configured limits.
    pub rule_count: usize,
    /// Threshold multiplier.
    pub exchange_rate: Decimal,
    /// Admin exemption floor.
    pub admin_floor: AdminTier,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "limitgate status")?;
        writeln!(f, "================")?;
        writeln!(f)?;
        writeln!(f, "Configuration:")?;
        writeln!(f, "  File: {}", self.config_path.display())?;
        if self.initialized {
            writeln!(f, "  Initialized: Yes")?;
        } else {
            writeln!(f, "  Initialized: No (using defaults; run 'limitgate init')")?;
        }
        writeln!(f)?;
        writeln!(f, "Limits:")?;
        writeln!(f, "  Rules: {}", self.rule_count)?;
        writeln!(f, "  Exchange rate: {}", self.exchange_rate)?;
        writeln!(f, "  Admin floor: {}", self.admin_floor)?;
        writeln!(f)?;
        writeln!(f, "History:")?;
        writeln!(f, "  Database: {}", self.database_path.display())?;
        match self.transfer_count {
            Some(count) => write!(f, "  Transfers: {count}"),
            None => write!(f, "  Transfers: database not created"),
        }
    }
}

// ============================================================================
// StatusCommand
// ============================================================================

/// The `status` command.
#[derive(Debug, Clone)]
pub struct StatusCommand {
    context: CommandContext,
}

impl StatusCommand {
    /// Creates the command.
    #[must_use]
    pub const fn new(context: CommandContext) -> Self {
        Self { context }
    }

    /// Runs the command, printing the report.
    ///
    /// # Errors
    ///
    /// See [`StatusCommand::execute`].
    pub fn run(&self) -> Result<(), StatusError> {
        println!("{}", self.execute()?);
        Ok(())
    }

    /// Collects the report. Does not create the database.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError`] if the configuration is invalid or an
    /// existing database cannot be read.
    pub fn execute(&self) -> Result<StatusReport, StatusError> {
        let loader = self.context.loader();
        let config = self.context.load_config()?;
        let registry = CommandContext::registry(&config)?;

        let database_path = PathBuf::from(&config.history.database_path);
        let transfer_count = if database_path.exists() {
            Some(CommandContext::open_history(&config)?.transfer_count()?)
        } else {
            None
        };

        Ok(StatusReport {
            config_path: loader.config_path(),
            initialized: loader.exists(),
            database_path,
            transfer_count,
            rule_count: registry.len(),
            exchange_rate: config.limits.exchange_rate,
            admin_floor: registry.admin_floor(),
        })
    }
}
