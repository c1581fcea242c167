//! Error types for the `limitgate` transfer-limit engine.
//!
//! This module provides the error taxonomy, organized by domain:
//!
//! - [`RejectionReason`] - A transfer failed a limit rule (the admission decision)
//! - [`HistoryError`] - The historical-transfer collaborator failed
//! - [`LimitError`] - Result of validating a transfer: rejection or lookup failure
//! - [`ConfigError`] - Configuration loading and validation failures
//! - [`LimitGateError`] - Top-level error that wraps all error types
//!
//! Rejections are never bare strings: every variant carries the limit name,
//! the token symbol and the numeric fields a caller needs to build its own
//! message.
//!
//! # Example
//!
//! ```rust
//! use limitgate_core::error::{LimitGateError, RejectionReason};
//!
//! let reason = RejectionReason::TransferCountExceeded {
//!     limit: "GE Liquid Token - Group Account User".to_string(),
//!     count: 1,
//!     window_days: 30,
//!     token: "GE".to_string(),
//! };
//!
//! assert_eq!(reason.kind(), "transfer_count_exceeded");
//! let err: LimitGateError = reason.into();
//! assert!(err.is_rejection());
//! ```

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{Amount, TransferId};

/// Top-level error type for `limitgate`.
#[derive(Debug, thiserror::Error)]
pub enum LimitGateError {
    /// The transfer was refused by a limit rule.
    #[error("Transfer rejected: {0}")]
    Rejected(#[from] RejectionReason),

    /// Historical data could not be read.
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl LimitGateError {
    /// Returns `true` if this error is a limit rejection.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Returns the rejection reason, if this error is one.
    #[must_use]
    pub const fn rejection(&self) -> Option<&RejectionReason> {
        match self {
            Self::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<LimitError> for LimitGateError {
    fn from(err: LimitError) -> Self {
        match err {
            LimitError::Rejected(reason) => Self::Rejected(reason),
            LimitError::History(err) => Self::History(err),
        }
    }
}

// ============================================================================
// RejectionReason
// ============================================================================

fn shown(available: &Amount) -> Amount {
    (*available).max(0)
}

/// Why a transfer was refused.
///
/// `available` fields hold the raw computed capacity, which may be negative
/// when earlier activity already exceeded the ceiling. Display output clamps
/// it at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The sender's tier may not make this kind of transfer at all.
    #[error("No {token} transfers of this kind are allowed (Limit {limit})")]
    NoTransferAllowed {
        /// Limit name.
        limit: String,
        /// Token symbol.
        token: String,
    },

    /// A single transfer exceeds a hard ceiling.
    #[error("Maximum Per Transfer Exceeded (Limit {limit}). {maximum} {token} available")]
    MaxPerTransferExceeded {
        /// Limit name.
        limit: String,
        /// Configured per-transfer ceiling.
        maximum: Amount,
        /// Requested amount.
        amount: Amount,
        /// Token symbol.
        token: String,
    },

    /// The rolling-window total would exceed a fixed ceiling.
    #[error("Account Limit \"{limit}\" reached. {} {token} available", shown(.available))]
    TotalAmountExceeded {
        /// Limit name.
        limit: String,
        /// Configured window total.
        total: Amount,
        /// Capacity left before this transfer.
        available: Amount,
        /// Window length in days.
        window_days: u32,
        /// Token symbol.
        token: String,
    },

    /// Withdrawals in the window would exceed recent reference activity.
    #[error("Account Limit \"{limit}\" reached. {} {token} available", shown(.available))]
    MinimumSentNotMet {
        /// Limit name.
        limit: String,
        /// Reference activity total in the window.
        reference_total: Amount,
        /// Capacity left before this transfer.
        available: Amount,
        /// Window length in days.
        window_days: u32,
        /// Token symbol.
        token: String,
    },

    /// The rolling-window total would exceed a fraction of the live balance.
    #[error("Account % Limit \"{limit}\" reached. {} {token} available", shown(.available))]
    BalanceFractionExceeded {
        /// Limit name.
        limit: String,
        /// Configured balance fraction.
        fraction: Decimal,
        /// Capacity left before this transfer.
        available: Amount,
        /// Window length in days.
        window_days: u32,
        /// Token symbol.
        token: String,
    },

    /// Too many transfers in the window.
    #[error("Account Limit \"{limit}\" reached. Allowed {count} {token} transaction(s) per {window_days} days")]
    TransferCountExceeded {
        /// Limit name.
        limit: String,
        /// Configured transfer count.
        count: u32,
        /// Window length in days.
        window_days: u32,
        /// Token symbol.
        token: String,
    },
}

impl RejectionReason {
    /// Returns a stable machine-readable code for the rejection kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NoTransferAllowed { .. } => "no_transfer_allowed",
            Self::MaxPerTransferExceeded { .. } => "max_per_transfer_exceeded",
            Self::TotalAmountExceeded { .. } => "total_amount_exceeded",
            Self::MinimumSentNotMet { .. } => "minimum_sent_not_met",
            Self::BalanceFractionExceeded { .. } => "balance_fraction_exceeded",
            Self::TransferCountExceeded { .. } => "transfer_count_exceeded",
        }
    }

    /// Returns the name of the limit that refused the transfer.
    #[must_use]
    pub fn limit_name(&self) -> &str {
        match self {
            Self::NoTransferAllowed { limit, .. }
            | Self::MaxPerTransferExceeded { limit, .. }
            | Self::TotalAmountExceeded { limit, .. }
            | Self::MinimumSentNotMet { limit, .. }
            | Self::BalanceFractionExceeded { limit, .. }
            | Self::TransferCountExceeded { limit, .. } => limit,
        }
    }

    /// Returns the token symbol of the refused transfer.
    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::NoTransferAllowed { token, .. }
            | Self::MaxPerTransferExceeded { token, .. }
            | Self::TotalAmountExceeded { token, .. }
            | Self::MinimumSentNotMet { token, .. }
            | Self::BalanceFractionExceeded { token, .. }
            | Self::TransferCountExceeded { token, .. } => token,
        }
    }

    /// Returns the aggregation window, for limits that have one.
    #[must_use]
    pub const fn window_days(&self) -> Option<u32> {
        match self {
            Self::NoTransferAllowed { .. } | Self::MaxPerTransferExceeded { .. } => None,
            Self::TotalAmountExceeded { window_days, .. }
            | Self::MinimumSentNotMet { window_days, .. }
            | Self::BalanceFractionExceeded { window_days, .. }
            | Self::TransferCountExceeded { window_days, .. } => Some(*window_days),
        }
    }

    /// Returns the computed available amount, for amount-based limits.
    #[must_use]
    pub const fn available(&self) -> Option<Amount> {
        match self {
            Self::NoTransferAllowed { .. } | Self::TransferCountExceeded { .. } => None,
            Self::MaxPerTransferExceeded { maximum, .. } => Some(*maximum),
            Self::TotalAmountExceeded { available, .. }
            | Self::MinimumSentNotMet { available, .. }
            | Self::BalanceFractionExceeded { available, .. } => Some(*available),
        }
    }
}

// ============================================================================
// HistoryError
// ============================================================================

/// Errors raised by the historical-transfer collaborator.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// The backing store failed.
    #[error("storage failure: {context}")]
    Storage {
        /// What was being attempted.
        context: String,
    },

    /// A stored row could not be decoded.
    #[error("invalid history record: {context}")]
    InvalidRecord {
        /// What was wrong with the row.
        context: String,
    },

    /// The referenced transfer does not exist.
    #[error("transfer not found: {id}")]
    TransferNotFound {
        /// The missing transfer id.
        id: TransferId,
    },
}

impl HistoryError {
    /// Create a `Storage` error.
    #[must_use]
    pub fn storage(context: impl Into<String>) -> Self {
        Self::Storage {
            context: context.into(),
        }
    }

    /// Create an `InvalidRecord` error.
    #[must_use]
    pub fn invalid_record(context: impl Into<String>) -> Self {
        Self::InvalidRecord {
            context: context.into(),
        }
    }
}

// ============================================================================
// LimitError
// ============================================================================

/// Outcome of a failed validation.
///
/// Callers translate [`LimitError::Rejected`] into a user-facing response;
/// [`LimitError::History`] means no decision could be made.
#[derive(Debug, thiserror::Error)]
pub enum LimitError {
    /// A limit refused the transfer.
    #[error(transparent)]
    Rejected(#[from] RejectionReason),

    /// Historical aggregation failed.
    #[error("limit evaluation failed: {0}")]
    History(#[from] HistoryError),
}

impl LimitError {
    /// Returns the rejection reason, if this is a rejection.
    #[must_use]
    pub const fn rejection(&self) -> Option<&RejectionReason> {
        match self {
            Self::Rejected(reason) => Some(reason),
            Self::History(_) => None,
        }
    }
}

// ============================================================================
// ConfigError
// ============================================================================

/// Errors that can occur during configuration loading and validation.
///
/// These are fatal at startup: a registry is never built from an invalid
/// configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {context}")]
    ParseFailed {
        /// Context about the parsing failure.
        context: String,
    },

    /// A configuration value is invalid.
    #[error("invalid value for {field}: {value}")]
    InvalidValue {
        /// The field name with the invalid value.
        field: String,
        /// The invalid value.
        value: String,
    },

    /// A required configuration field is missing.
    #[error("missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// Reading or writing the configuration failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The home directory could not be determined.
    #[error("could not determine home directory")]
    NoHomeDirectory,
}

impl ConfigError {
    /// Create a `FileNotFound` error.
    #[must_use]
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a `ParseFailed` error.
    #[must_use]
    pub fn parse_failed(context: impl Into<String>) -> Self {
        Self::ParseFailed {
            context: context.into(),
        }
    }

    /// Create an `InvalidValue` error.
    #[must_use]
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a `MissingField` error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an `Io` error.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a `NoHomeDirectory` error.
    #[must_use]
    pub const fn no_home_directory() -> Self {
        Self::NoHomeDirectory
    }
}

// ============================================================================
// Result type aliases
// ============================================================================

/// A `Result` type alias using [`LimitGateError`] as the error type.
pub type Result<T> = std::result::Result<T, LimitGateError>;

/// A `Result` type alias for history operations.
pub type HistoryResult<T> = std::result::Result<T, HistoryError>;

/// A `Result` type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use rust_decimal_macros::dec;
    use std::error::Error;

    fn total_amount(available: Amount) -> RejectionReason {
        RejectionReason::TotalAmountExceeded {
            limit: "Sempo Level 1: P7".to_string(),
            total: 5000,
            available,
            window_days: 7,
            token: "SARAFU".to_string(),
        }
    }

    #[test]
    fn test_total_amount_message_clamps_negative_available() {
        assert_eq!(
            total_amount(-20).to_string(),
            "Account Limit \"Sempo Level 1: P7\" reached. 0 SARAFU available"
        );
        assert_eq!(
            total_amount(120).to_string(),
            "Account Limit \"Sempo Level 1: P7\" reached. 120 SARAFU available"
        );
    }

    #[test]
    fn test_structured_fields_survive() {
        let reason = total_amount(-20);
        assert_eq!(reason.kind(), "total_amount_exceeded");
        assert_eq!(reason.limit_name(), "Sempo Level 1: P7");
        assert_eq!(reason.token(), "SARAFU");
        assert_eq!(reason.window_days(), Some(7));
        assert_eq!(reason.available(), Some(-20));
    }

    #[test]
    fn test_max_per_transfer_message() {
        let reason = RejectionReason::MaxPerTransferExceeded {
            limit: "GE Liquid Token - Group Account User".to_string(),
            maximum: 50_000,
            amount: 50_001,
            token: "GE".to_string(),
        };
        assert_eq!(
            reason.to_string(),
            "Maximum Per Transfer Exceeded (Limit GE Liquid Token - Group Account User). 50000 GE available"
        );
        assert_eq!(reason.window_days(), None);
        assert_eq!(reason.available(), Some(50_000));
    }

    #[test]
    fn test_rejection_serializes_with_kind_tag() {
        let reason = RejectionReason::BalanceFractionExceeded {
            limit: "GE".to_string(),
            fraction: dec!(0.50),
            available: 10,
            window_days: 30,
            token: "GE".to_string(),
        };
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["kind"], "balance_fraction_exceeded");
        assert_eq!(json["fraction"], "0.50");
        assert_eq!(json["available"], 10);
    }

    #[test]
    fn test_limit_error_conversions() {
        let err: LimitError = total_amount(0).into();
        assert!(err.rejection().is_some());
        assert!(err.source().is_none());

        let err: LimitError = HistoryError::storage("pool exhausted").into();
        assert!(err.rejection().is_none());
        assert_eq!(
            err.to_string(),
            "limit evaluation failed: storage failure: pool exhausted"
        );

        let top: LimitGateError = err.into();
        assert!(matches!(top, LimitGateError::History(_)));
        assert!(!top.is_rejection());
    }

    #[test]
    fn test_top_level_rejection_display() {
        let err: LimitGateError = RejectionReason::NoTransferAllowed {
            limit: "Sempo Level 0: WD30".to_string(),
            token: "SARAFU".to_string(),
        }
        .into();

        assert!(err.is_rejection());
        assert_eq!(
            err.rejection().map(RejectionReason::kind),
            Some("no_transfer_allowed")
        );
        assert_eq!(
            err.to_string(),
            "Transfer rejected: No SARAFU transfers of this kind are allowed (Limit Sempo Level 0: WD30)"
        );
    }

    #[test]
    fn test_config_error_constructors() {
        let err = ConfigError::missing_field("limits.thresholds.2.P7");
        assert_eq!(err.to_string(), "missing required field: limits.thresholds.2.P7");

        let err = ConfigError::invalid_value("limits.exchange_rate", "-1");
        assert_eq!(err.to_string(), "invalid value for limits.exchange_rate: -1");

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ConfigError::io("failed to read config.toml", io);
        assert!(err.source().is_some());
    }
}
