//! # limitgate-core
//!
//! Core types, error definitions and configuration for the `limitgate`
//! transfer-limit engine.
//!
//! ## Modules
//!
//! - [`types`] - Transfer and user snapshots ([`Transfer`], [`User`], [`Token`])
//! - [`error`] - Rejection reasons, error types and result aliases
//! - [`config`] - Limit thresholds and history store settings
//! - [`config_loader`] - Reading and writing `~/.limitgate/config.toml`
//!
//! ## Rejections
//!
//! ```rust
//! use limitgate_core::{LimitError, RejectionReason};
//!
//! let err: LimitError = RejectionReason::MaxPerTransferExceeded {
//!     limit: "GE Liquid Token - Group Account User".to_string(),
//!     maximum: 500,
//!     amount: 501,
//!     token: "GE".to_string(),
//! }
//! .into();
//!
//! let reason = err.rejection().expect("a rejection");
//! assert_eq!(reason.available(), Some(500));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod config_loader;
pub mod error;
pub mod types;

pub use error::{
    ConfigError, ConfigResult, HistoryError, HistoryResult, LimitError, LimitGateError,
    RejectionReason, Result,
};

pub use config::{Config, ConfigBuilder, HistoryConfig, LimitsConfig, THRESHOLD_KEYS};

pub use config_loader::{expand_path, load_config, ConfigLoader};

pub use types::{
    AdminTier, Amount, KycApplication, KycStatus, KycType, Token, TokenType, Transfer,
    TransferId, TransferStatus, TransferSubtype, TransferType, User, UserId,
};

pub use rust_decimal::Decimal;
