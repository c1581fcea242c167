//! # Check Command
//!
//! Implementation of `limitgate check`, which evaluates one transfer against
//! the configured limits.
//!
//! The transfer is stamped with the current time and recorded as `PENDING`
//! before evaluation so that it is part of its own windows, then marked
//! `REJECTED` if a limit refuses it or the history fails mid-evaluation. An
//! admitted transfer stays pending until the caller completes it with
//! `limitgate history set-status`.
//!
//! ## Output Formats
//!
//! ### Text (default)
//!
//! ```text
//! REJECTED: transfer 42
//!   - Sempo Level 0: P7: Account Limit "Sempo Level 0: P7" reached. 2000 GE available
//! ```
//!
//! ### JSON
//!
//! ```json
//! {
//!   "transfer_id": 42,
//!   "allowed": false,
//!   "applicable": 2,
//!   "violations": [
//!     {
//!       "limit": "Sempo Level 0: P7",
//!       "message": "Account Limit \"Sempo Level 0: P7\" reached. 2000 GE available",
//!       "reason": { "kind": "total_amount_exceeded", "...": "..." }
//!     }
//!   ]
//! }
//! ```
//!
//! ## Exit Codes
//!
//! - 0: Within limits
//! - 1: Rejected
//! - 2: Other error

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use limitgate_core::error::{ConfigError, HistoryError, RejectionReason};
use limitgate_core::types::{Transfer, TransferId, TransferStatus};
use limitgate_policy::engine::{LimitEngine, LimitCheckResult, LimitEvaluator};
use limitgate_policy::history::TransferHistory;

use super::context::{read_transfer, CommandContext, InputError};
use super::exit_codes::{EXIT_ERROR, EXIT_REJECTED};
use crate::cli::args::OutputFormat;

// ============================================================================
// CheckCommandError
// ============================================================================

/// Errors from `limitgate check`.
#[derive(Debug, thiserror::Error)]
pub enum CheckCommandError {
    /// A limit refused the transfer.
    #[error("Rejected: {rule} - {reason}")]
    Rejected {
        /// Name of the first violated limit.
        rule: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The history database failed; no decision was made.
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// The transfer argument could not be read.
    #[error(transparent)]
    Input(#[from] InputError),

    /// The JSON output could not be produced.
    #[error("Failed to format output: {0}")]
    Output(#[source] serde_json::Error),
}

impl CheckCommandError {
    /// Returns the process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Rejected { .. } => EXIT_REJECTED,
            _ => EXIT_ERROR,
        }
    }
}

// ============================================================================
// CheckOutput
// ============================================================================

/// One violated limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Limit name.
    pub limit: String,
    /// Human-readable message.
    pub message: String,
    /// Structured reason.
    pub reason: RejectionReason,
}

impl From<RejectionReason> for Violation {
    fn from(reason: RejectionReason) -> Self {
        Self {
            limit: reason.limit_name().to_string(),
            message: reason.to_string(),
            reason,
        }
    }
}

/// Result of evaluating one transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutput {
    /// Evaluated transfer.
    pub transfer_id: TransferId,
    /// Whether every applicable limit passed.
    pub allowed: bool,
    /// Number of limits that applied.
    pub applicable: usize,
    /// Violations in declaration order; at most one unless `--all` was given.
    pub violations: Vec<Violation>,
}

impl CheckOutput {
    fn to_text(&self) -> String {
        if self.allowed {
            return format!(
                "ALLOWED: transfer {} is within all {} applicable limit(s)",
                self.transfer_id, self.applicable
            );
        }

        let mut out = format!("REJECTED: transfer {}", self.transfer_id);
        for violation in &self.violations {
            out.push_str(&format!("\n  - {}: {}", violation.limit, violation.message));
        }
        out
    }
}

// ============================================================================
// CheckCommand
// ============================================================================

/// The `check` command.
#[derive(Debug, Clone)]
pub struct CheckCommand {
    context: CommandContext,
    transfer: String,
    format: OutputFormat,
    all: bool,
}

impl CheckCommand {
    /// Creates the command. `transfer` is inline JSON or a file path.
    #[must_use]
    pub fn new(
        context: CommandContext,
        transfer: impl Into<String>,
        format: OutputFormat,
        all: bool,
    ) -> Self {
        Self {
            context,
            transfer: transfer.into(),
            format,
            all,
        }
    }

    /// Runs the command and prints the result.
    ///
    /// # Errors
    ///
    /// Returns [`CheckCommandError::Rejected`] after printing if a limit
    /// refused the transfer, or any error from [`CheckCommand::execute`].
    pub fn run(&self) -> Result<(), CheckCommandError> {
        let output = self.execute()?;

        let rendered = match self.format {
            OutputFormat::Text => output.to_text(),
            OutputFormat::Json => {
                serde_json::to_string_pretty(&output).map_err(CheckCommandError::Output)?
            }
        };
        println!("{rendered}");

        match output.violations.into_iter().next() {
            Some(first) => Err(CheckCommandError::Rejected {
                rule: first.limit,
                reason: first.message,
            }),
            None => Ok(()),
        }
    }

    /// Records and evaluates the transfer.
    ///
    /// A rejection is a successful evaluation: it is returned in the output,
    /// not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`CheckCommandError`] if the input, configuration or history
    /// database fails.
    pub fn execute(&self) -> Result<CheckOutput, CheckCommandError> {
        let mut transfer = read_transfer(&self.transfer)?;
        transfer.status = TransferStatus::Pending;
        transfer.created_at = Utc::now();

        let config = self.context.load_config()?;
        let registry = Arc::new(CommandContext::registry(&config)?);
        let history = CommandContext::open_history(&config)?;

        history.record(&transfer)?;
        tracing::debug!(transfer_id = transfer.id, "Recorded pending transfer");

        let evaluator = LimitEvaluator::new(registry, history);
        let applicable = evaluator.get_applicable_limits(&transfer).len();

        let violations = evaluate(&evaluator, &transfer, self.all, |id| {
            evaluator.history().set_status(id, TransferStatus::Rejected)
        })?;

        Ok(CheckOutput {
            transfer_id: transfer.id,
            allowed: violations.is_empty(),
            applicable,
            violations: violations.into_iter().map(Violation::from).collect(),
        })
    }
}

/// Evaluates a recorded candidate and settles its stored status.
///
/// `mark_rejected` runs when a limit refuses the transfer and also when the
/// history fails before a decision, so the pending row stops counting.
fn evaluate<H, F>(
    evaluator: &LimitEvaluator<H>,
    transfer: &Transfer,
    all: bool,
    mark_rejected: F,
) -> Result<Vec<RejectionReason>, HistoryError>
where
    H: TransferHistory,
    F: Fn(TransferId) -> Result<(), HistoryError>,
{
    let outcome = if all {
        evaluator.check_all(transfer)
    } else {
        evaluator.check(transfer).map(|result| match result {
            LimitCheckResult::Allowed => Vec::new(),
            LimitCheckResult::Rejected(reason) => vec![reason],
        })
    };

    match outcome {
        Ok(violations) => {
            if !violations.is_empty() {
                mark_rejected(transfer.id)?;
            }
            Ok(violations)
        }
        Err(e) => {
            if let Err(mark_err) = mark_rejected(transfer.id) {
                tracing::warn!(
                    transfer_id = transfer.id,
                    error = %mark_err,
                    "Failed to release transfer after history error"
                );
            }
            Err(e)
        }
    }
}
