//! `limitgate config`: show, locate or validate the configuration.

use std::path::PathBuf;

use limitgate_core::config::Config;
use limitgate_core::error::ConfigError;

use super::context::CommandContext;
use crate::cli::args::ConfigAction;

// ============================================================================
// ConfigCommandError
// ============================================================================

/// Errors from `limitgate config`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigCommandError {
    /// No configuration file exists yet.
    #[error("limitgate is not initialized ({0} not found). Run 'limitgate init' first.")]
    NotInitialized(PathBuf),

    /// The configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

// ============================================================================
// ConfigCommand
// ============================================================================

/// The `config` command.
#[derive(Debug, Clone)]
pub struct ConfigCommand {
    context: CommandContext,
    action: Option<ConfigAction>,
}

impl ConfigCommand {
    /// Creates the command.
    #[must_use]
    pub const fn new(context: CommandContext, action: Option<ConfigAction>) -> Self {
        Self { context, action }
    }

    /// Runs the command, printing its output.
    ///
    /// # Errors
    ///
    /// See [`ConfigCommand::execute`].
    pub fn run(&self) -> Result<(), ConfigCommandError> {
        println!("{}", self.execute()?.trim_end());
        Ok(())
    }

    /// Produces the command output.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigCommandError::NotInitialized`] if showing or
    /// validating a missing file, or [`ConfigCommandError::Config`] if it
    /// fails to load or validate.
    pub fn execute(&self) -> Result<String, ConfigCommandError> {
        let loader = self.context.loader();
        match self.action {
            Some(ConfigAction::Path) => Ok(loader.config_path().display().to_string()),
            None => {
                let config = self.load_required()?;
                format_toml_output(&config)
            }
            Some(ConfigAction::Validate) => {
                self.load_required()?;
                let config = self.context.load_config()?;
                let registry = CommandContext::registry(&config)?;
                Ok(format!(
                    "Configuration is valid: {} limits, exchange rate {}, history at {}",
                    registry.len(),
                    config.limits.exchange_rate,
                    config.history.database_path
                ))
            }
        }
    }

    fn load_required(&self) -> Result<Config, ConfigCommandError> {
        let loader = self.context.loader();
        if !loader.exists() {
            return Err(ConfigCommandError::NotInitialized(loader.config_path()));
        }
        Ok(loader.load_required()?)
    }
}

fn format_toml_output(config: &Config) -> Result<String, ConfigCommandError> {
    toml::to_string_pretty(config).map_err(|e| {
        ConfigError::parse_failed(format!("failed to serialize configuration: {e}")).into()
    })
}
