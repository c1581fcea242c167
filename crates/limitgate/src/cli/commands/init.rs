//! `limitgate init`: write the default configuration and create the
//! history database next to it.

use std::path::PathBuf;

use limitgate_core::error::{ConfigError, HistoryError};

use super::context::CommandContext;

// ============================================================================
// InitError
// ============================================================================

/// Errors from `limitgate init`.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// A configuration file already exists and `--force` was not given.
    #[error("limitgate is already initialized at {0}. Use --force to reinitialize.")]
    AlreadyInitialized(PathBuf),

    /// The configuration could not be written or read back.
    #[error("Failed to write config: {0}")]
    Config(#[from] ConfigError),

    /// The history database could not be created.
    #[error("Failed to create history database: {0}")]
    History(#[from] HistoryError),
}

// ============================================================================
// InitCommand
// ============================================================================

/// Paths created by a successful init.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    /// Written configuration file.
    pub config_path: PathBuf,
    /// Created (or reused) history database.
    pub database_path: PathBuf,
}

/// The `init` command.
#[derive(Debug, Clone)]
pub struct InitCommand {
    context: CommandContext,
    force: bool,
}

impl InitCommand {
    /// Creates the command.
    #[must_use]
    pub const fn new(context: CommandContext, force: bool) -> Self {
        Self { context, force }
    }

    /// Runs the command and prints next steps.
    ///
    /// # Errors
    ///
    /// See [`InitCommand::execute`].
    pub fn run(&self) -> Result<(), InitError> {
        let report = self.execute()?;

        println!("limitgate initialized successfully!");
        println!();
        println!("  Config:   {}", report.config_path.display());
        println!("  History:  {}", report.database_path.display());
        println!();
        println!("Next steps:");
        println!("  1. Review thresholds: limitgate config");
        println!("  2. View status: limitgate status");
        println!("  3. Check a transfer: limitgate check transfer.json");
        Ok(())
    }

    /// Writes the default configuration and initializes the database schema.
    ///
    /// An existing database is kept; only its schema is ensured.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::AlreadyInitialized`] if a configuration exists
    /// and `force` is unset, or a wrapped config/history error.
    pub fn execute(&self) -> Result<InitReport, InitError> {
        let loader = self.context.loader();
        if loader.exists() && !self.force {
            return Err(InitError::AlreadyInitialized(loader.config_path()));
        }

        loader.write_default()?;
        let config = self.context.load_config()?;
        CommandContext::open_history(&config)?;

        tracing::info!(config = %loader.config_path().display(), "Initialized configuration");

        Ok(InitReport {
            config_path: loader.config_path(),
            database_path: PathBuf::from(config.history.database_path),
        })
    }
}
