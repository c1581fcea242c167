//! `limitgate limits`: list configured limits, or those applying to a transfer.

use serde::Serialize;

use limitgate_core::error::ConfigError;
use limitgate_policy::limit::LimitRule;
use limitgate_policy::predicates::{verification_tier, VerificationTier};

use super::context::{read_transfer, CommandContext, InputError};
use crate::cli::args::OutputFormat;

/// Errors from `limitgate limits`.
#[derive(Debug, thiserror::Error)]
pub enum LimitsCommandError {
    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The transfer argument could not be read.
    #[error(transparent)]
    Input(#[from] InputError),

    /// The JSON output could not be produced.
    #[error("Failed to format output: {0}")]
    Output(#[source] serde_json::Error),
}

/// Listed limits, with the sender's tier when a transfer was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitsListing {
    /// Sender tier of the given transfer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<VerificationTier>,
    /// Rules in declaration order.
    pub limits: Vec<LimitRule>,
}

/// The `limits` command.
#[derive(Debug, Clone)]
pub struct LimitsCommand {
    context: CommandContext,
    transfer: Option<String>,
    format: OutputFormat,
}

impl LimitsCommand {
    /// Creates the command.
    #[must_use]
    pub const fn new(context: CommandContext, transfer: Option<String>, format: OutputFormat) -> Self {
        Self {
            context,
            transfer,
            format,
        }
    }

    /// Runs the command and prints the listing.
    ///
    /// # Errors
    ///
    /// See [`LimitsCommand::execute`].
    pub fn run(&self) -> Result<(), LimitsCommandError> {
        let listing = self.execute()?;
        match self.format {
            OutputFormat::Text => println!("{}", format_text(&listing)),
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&listing).map_err(LimitsCommandError::Output)?
            ),
        }
        Ok(())
    }

    /// Builds the registry and selects the rules to list.
    ///
    /// # Errors
    ///
    /// Returns [`LimitsCommandError`] if the configuration or transfer
    /// cannot be read.
    pub fn execute(&self) -> Result<LimitsListing, LimitsCommandError> {
        let config = self.context.load_config()?;
        let registry = CommandContext::registry(&config)?;

        let Some(input) = self.transfer.as_deref() else {
            return Ok(LimitsListing {
                tier: None,
                limits: registry.rules().to_vec(),
            });
        };

        let transfer = read_transfer(input)?;
        Ok(LimitsListing {
            tier: verification_tier(&transfer),
            limits: registry
                .applicable(&transfer)
                .into_iter()
                .cloned()
                .collect(),
        })
    }
}

fn format_text(listing: &LimitsListing) -> String {
    let mut lines = Vec::with_capacity(listing.limits.len() + 1);
    if let Some(tier) = listing.tier {
        lines.push(format!("Sender tier: Sempo Level {}", tier.level()));
    }
    if listing.limits.is_empty() {
        lines.push("No limits apply.".to_string());
    }
    for rule in &listing.limits {
        let window = rule
            .kind()
            .window_days()
            .map_or_else(String::new, |days| format!(", {days} days"));
        lines.push(format!("{rule}{window}"));
    }
    lines.join("\n")
}
