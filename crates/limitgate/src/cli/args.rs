//! Command-line argument definitions.
//!
//! ```text
//! limitgate [OPTIONS] <COMMAND>
//!
//! Commands:
//!   init      Write the default configuration and create the history database
//!   status    Show configuration, database and rule counts
//!   config    Show, locate or validate the configuration
//!   check     Evaluate a transfer against the configured limits
//!   limits    List configured or applicable limits
//!   history   Manage the transfer history database
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::logging::LogFormat;

/// Tiered transfer-limit engine.
#[derive(Debug, Parser)]
#[command(name = "limitgate")]
#[command(author, version, about = "Tiered transfer-limit engine")]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (must be named `config.toml`). Defaults to `~/.limitgate/config.toml`.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, default_value = "compact", value_name = "FORMAT")]
    pub log_format: LogFormat,

    /// Also write logs to this file, rotated daily.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write the default configuration and create the history database.
    Init {
        /// Overwrite an existing configuration.
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration, database and rule counts.
    Status,

    /// Show the configuration, its path, or validate it.
    Config {
        /// What to do; shows the configuration when omitted.
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Evaluate a transfer against the configured limits.
    ///
    /// The transfer is recorded as pending first and marked rejected if it
    /// fails. Exits with 1 on rejection and 2 on any other error.
    Check {
        /// Transfer as inline JSON or a path to a JSON file.
        #[arg(value_name = "TRANSFER")]
        transfer: String,

        /// Output format.
        #[arg(short, long, default_value = "text", value_name = "FORMAT")]
        format: OutputFormat,

        /// Report every violated limit instead of the first.
        #[arg(short, long)]
        all: bool,
    },

    /// List configured limits, or those applying to a transfer.
    Limits {
        /// Transfer as inline JSON or a path to a JSON file.
        #[arg(value_name = "TRANSFER")]
        transfer: Option<String>,

        /// Output format.
        #[arg(short, long, default_value = "text", value_name = "FORMAT")]
        format: OutputFormat,
    },

    /// Manage the transfer history database.
    History {
        /// History operation.
        #[command(subcommand)]
        command: HistoryCommands,
    },
}

/// Configuration actions.
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Print the configuration file path.
    Path,

    /// Validate the configuration and build the limit registry.
    Validate,
}

/// History database operations.
#[derive(Debug, Clone, Subcommand)]
pub enum HistoryCommands {
    /// Record (or replace) a transfer without evaluating it.
    Record {
        /// Transfer as inline JSON or a path to a JSON file.
        #[arg(value_name = "TRANSFER")]
        transfer: String,
    },

    /// Show a user's balance, or set it when an amount is given.
    Balance {
        /// User id.
        #[arg(value_name = "USER_ID")]
        user_id: u64,

        /// New balance in minor units.
        #[arg(value_name = "AMOUNT", allow_negative_numbers = true)]
        amount: Option<i64>,
    },

    /// Change a stored transfer's status.
    SetStatus {
        /// Transfer id.
        #[arg(value_name = "TRANSFER_ID")]
        transfer_id: u64,

        /// New status (`PENDING`, `COMPLETE` or `REJECTED`).
        #[arg(value_name = "STATUS")]
        status: String,
    },

    /// List a sender's most recent transfers.
    List {
        /// Sender id.
        #[arg(value_name = "SENDER_ID")]
        sender_id: u64,

        /// Maximum rows.
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Output format.
        #[arg(short, long, default_value = "text", value_name = "FORMAT")]
        format: OutputFormat,
    },

    /// Delete transfers older than the given number of days.
    Cleanup {
        /// Age threshold in days.
        #[arg(long, default_value_t = 90, value_name = "DAYS")]
        older_than_days: u32,
    },
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,

    /// JSON.
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
