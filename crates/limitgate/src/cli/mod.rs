//! # CLI Module
//!
//! Command-line interface for `limitgate`.
//!
//! ## Module Structure
//!
//! - [`args`] - Argument parsing and CLI structure definitions
//! - [`commands`] - Command handler implementations
//!
//! ## Commands
//!
//! - `limitgate init [--force]` - Write the default configuration
//! - `limitgate status` - Display configuration and database status
//! - `limitgate config [path|validate]` - View or validate configuration
//! - `limitgate check <TRANSFER> [--format text|json] [--all]` - Evaluate a transfer
//! - `limitgate limits [TRANSFER] [--format text|json]` - List limits
//! - `limitgate history record <TRANSFER>` - Store a transfer
//! - `limitgate history balance <USER_ID> [AMOUNT]` - Show or set a balance
//! - `limitgate history set-status <TRANSFER_ID> <STATUS>` - Update a transfer
//! - `limitgate history list <SENDER_ID> [-n N]` - Recent transfers
//! - `limitgate history cleanup [--older-than-days N]` - Delete old transfers

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, ConfigAction, HistoryCommands, OutputFormat};
