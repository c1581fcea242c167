//! # Command Handlers
//!
//! One module per `limitgate` command. Each command is a struct with a
//! `run` method that prints its result and an `execute` method that
//! returns it.

pub mod check;
pub mod config;
pub mod context;
pub mod exit_codes;
pub mod history;
pub mod init;
pub mod limits;
pub mod status;

pub use check::{CheckCommand, CheckCommandError, CheckOutput, Violation};
pub use config::{ConfigCommand, ConfigCommandError};
pub use context::{read_transfer, CommandContext, InputError};
pub use history::{HistoryCommand, HistoryCommandError, HistoryOutput};
pub use init::{InitCommand, InitError, InitReport};
pub use limits::{LimitsCommand, LimitsCommandError, LimitsListing};
pub use status::{StatusCommand, StatusError, StatusReport};
