//! `limitgate history`: inspect and maintain the transfer history database.

use limitgate_core::error::{ConfigError, HistoryError};
use limitgate_core::types::{
    Amount, TransferId, TransferStatus, TransferSubtype, UnknownVariant, UserId,
};
use limitgate_policy::history::{SqliteHistory, TransferHistory, TransferRecord};

use super::context::{read_transfer, CommandContext, InputError};
use crate::cli::args::{HistoryCommands, OutputFormat};

// ============================================================================
// HistoryCommandError
// ============================================================================

/// Errors from `limitgate history`.
#[derive(Debug, thiserror::Error)]
pub enum HistoryCommandError {
    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The history database failed.
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// The transfer argument could not be read.
    #[error(transparent)]
    Input(#[from] InputError),

    /// Unrecognized transfer status.
    #[error(transparent)]
    InvalidStatus(#[from] UnknownVariant),

    /// The JSON output could not be produced.
    #[error("Failed to format output: {0}")]
    Output(#[source] serde_json::Error),
}

// ============================================================================
// HistoryOutput
// ============================================================================

/// Result of a history operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutput {
    /// A transfer was stored.
    Recorded(TransferId),
    /// A user's balance, after any update.
    Balance {
        /// User id.
        user_id: UserId,
        /// Balance in minor units.
        balance: Amount,
    },
    /// A transfer's status was changed.
    StatusChanged {
        /// Transfer id.
        transfer_id: TransferId,
        /// New status.
        status: TransferStatus,
    },
    /// A sender's transfers, newest first.
    Transfers(Vec<TransferRecord>),
    /// Old transfers were deleted.
    Cleaned(usize),
}

impl HistoryOutput {
    fn render(&self, format: OutputFormat) -> Result<String, serde_json::Error> {
        match (self, format) {
            (Self::Transfers(records), OutputFormat::Json) => {
                serde_json::to_string_pretty(records)
            }
            (Self::Transfers(records), OutputFormat::Text) => Ok(format_records(records)),
            (Self::Recorded(id), _) => Ok(format!("Recorded transfer {id}")),
            (Self::Balance { user_id, balance }, _) => {
                Ok(format!("User {user_id} balance: {balance}"))
            }
            (
                Self::StatusChanged {
                    transfer_id,
                    status,
                },
                _,
            ) => Ok(format!("Transfer {transfer_id} is now {status}")),
            (Self::Cleaned(count), _) => Ok(format!("Deleted {count} transfer(s)")),
        }
    }
}

fn format_records(records: &[TransferRecord]) -> String {
    if records.is_empty() {
        return "No transfers found.".to_string();
    }

    let mut lines = vec![format!(
        "{:<10} {:<20} {:>12} {:<8} {:<10} {:<11} {:<8}",
        "ID", "CREATED", "AMOUNT", "TOKEN", "TYPE", "SUBTYPE", "STATUS"
    )];
    for record in records {
        lines.push(format!(
            "{:<10} {:<20} {:>12} {:<8} {:<10} {:<11} {:<8}",
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.amount,
            record.token,
            record.transfer_type.as_str(),
            record.transfer_subtype.map_or("-", TransferSubtype::as_str),
            record.status.as_str(),
        ));
    }
    lines.join("\n")
}

// ============================================================================
// HistoryCommand
// ============================================================================

/// The `history` command and its subcommands.
#[derive(Debug, Clone)]
pub struct HistoryCommand {
    context: CommandContext,
    command: HistoryCommands,
}

impl HistoryCommand {
    /// Creates the command.
    #[must_use]
    pub const fn new(context: CommandContext, command: HistoryCommands) -> Self {
        Self { context, command }
    }

    /// Runs the subcommand and prints its result.
    ///
    /// # Errors
    ///
    /// See [`HistoryCommand::execute`].
    pub fn run(&self) -> Result<(), HistoryCommandError> {
        let format = match self.command {
            HistoryCommands::List { format, .. } => format,
            _ => OutputFormat::Text,
        };
        let output = self.execute()?;
        println!(
            "{}",
            output.render(format).map_err(HistoryCommandError::Output)?
        );
        Ok(())
    }

    /// Runs the subcommand against the configured database.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryCommandError`] if the configuration, input or
    /// database fails.
    pub fn execute(&self) -> Result<HistoryOutput, HistoryCommandError> {
        let config = self.context.load_config()?;
        let history = CommandContext::open_history(&config)?;
        apply(&history, &self.command)
    }
}

fn apply(
    history: &SqliteHistory,
    command: &HistoryCommands,
) -> Result<HistoryOutput, HistoryCommandError> {
    match command {
        HistoryCommands::Record { transfer } => {
            let transfer = read_transfer(transfer)?;
            history.record(&transfer)?;
            tracing::info!(transfer_id = transfer.id, status = %transfer.status, "Recorded transfer");
            Ok(HistoryOutput::Recorded(transfer.id))
        }
        HistoryCommands::Balance { user_id, amount } => {
            if let Some(balance) = amount {
                history.set_balance(*user_id, *balance)?;
                tracing::info!(user_id, balance, "Updated balance");
            }
            Ok(HistoryOutput::Balance {
                user_id: *user_id,
                balance: history.current_balance(*user_id)?,
            })
        }
        HistoryCommands::SetStatus {
            transfer_id,
            status,
        } => {
            let status: TransferStatus = status.parse()?;
            history.set_status(*transfer_id, status)?;
            tracing::info!(transfer_id, status = %status, "Updated transfer status");
            Ok(HistoryOutput::StatusChanged {
                transfer_id: *transfer_id,
                status,
            })
        }
        HistoryCommands::List {
            sender_id, limit, ..
        } => Ok(HistoryOutput::Transfers(
            history.get_transfers(*sender_id, *limit)?,
        )),
        HistoryCommands::Cleanup { older_than_days } => {
            let removed = history.cleanup(*older_than_days)?;
            tracing::info!(removed, older_than_days, "Cleaned up transfer history");
            Ok(HistoryOutput::Cleaned(removed))
        }
    }
}
