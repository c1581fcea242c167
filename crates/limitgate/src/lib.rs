//! # limitgate
//!
//! Command-line front end for the `limitgate` transfer-limit engine.
//!
//! ## Usage
//!
//! ```bash
//! # Write ~/.limitgate/config.toml and create the history database
//! limitgate init
//!
//! # Evaluate a transfer; exits 1 when a limit refuses it
//! limitgate check transfer.json
//!
//! # Show every violated limit as JSON
//! limitgate check '{"id": 1, "amount": 500, "transfer_type": "WITHDRAWAL"}' --all --format json
//!
//! # Mark an admitted transfer complete
//! limitgate history set-status 1 COMPLETE
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cli;
pub mod logging;

pub use cli::{Cli, Commands};
pub use logging::{init_logging, LogConfig, LogError, LogFormat, LogGuard, LogLevel};
