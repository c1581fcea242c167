//! # `limitgate`
//!
//! Tiered transfer-limit engine.
//!
//! ## Exit Codes
//!
//! - 0: Success, or the transfer is within its limits
//! - 1: The transfer was rejected
//! - 2: Any other error

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::path::PathBuf;

use clap::Parser;
use limitgate::cli::commands::exit_codes::EXIT_ERROR;
use limitgate::cli::commands::{
    CheckCommand, CommandContext, ConfigCommand, HistoryCommand, InitCommand, LimitsCommand,
    StatusCommand,
};
use limitgate::cli::{Cli, Commands};
use limitgate::logging::{init_logging, verbosity_to_level, LogConfig, LogError, LogFormat, LogGuard};

/// Set up logging from the global flags.
///
/// # Errors
///
/// Returns [`LogError`] if logging initialization fails.
fn setup_logging(
    verbose: u8,
    format: LogFormat,
    file_path: Option<PathBuf>,
) -> Result<LogGuard, LogError> {
    let config = LogConfig {
        level: verbosity_to_level(verbose),
        format,
        file_path,
    };
    init_logging(&config)
}

fn main() {
    let cli = Cli::parse();

    let _guard = match setup_logging(cli.verbose, cli.log_format, cli.log_file) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            std::process::exit(EXIT_ERROR);
        }
    };

    let context = match CommandContext::resolve(cli.config.as_deref()) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_ERROR);
        }
    };

    let result = match cli.command {
        Commands::Init { force } => InitCommand::new(context, force)
            .run()
            .map_err(|e| e.to_string()),
        Commands::Status => StatusCommand::new(context)
            .run()
            .map_err(|e| e.to_string()),
        Commands::Config { action } => ConfigCommand::new(context, action)
            .run()
            .map_err(|e| e.to_string()),
        Commands::Check {
            transfer,
            format,
            all,
        } => {
            if let Err(e) = CheckCommand::new(context, transfer, format, all).run() {
                eprintln!("{e}");
                std::process::exit(e.exit_code());
            }
            Ok(())
        }
        Commands::Limits { transfer, format } => LimitsCommand::new(context, transfer, format)
            .run()
            .map_err(|e| e.to_string()),
        Commands::History { command } => HistoryCommand::new(context, command)
            .run()
            .map_err(|e| e.to_string()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(EXIT_ERROR);
    }
}
