//! Process exit codes shared by all commands.

/// Successful operation, or the transfer is within its limits.
pub const EXIT_SUCCESS: i32 = 0;

/// The transfer violated a limit.
pub const EXIT_REJECTED: i32 = 1;

/// Any other failure (configuration, history database, invalid input).
pub const EXIT_ERROR: i32 = 2;
