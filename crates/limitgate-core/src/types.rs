//! Core types for the `limitgate` transfer-limit engine.
//!
//! This module provides the value types the policy engine reads:
//!
//! - [`Transfer`] - Immutable snapshot of a proposed or historical transfer
//! - [`User`] - Sender/recipient state (roles, KYC, phone verification)
//! - [`Token`] - Token symbol and category
//! - Classification enums ([`TransferType`], [`TransferSubtype`], [`TransferStatus`])
//!
//! All amounts are `i64` values denominated in the token's minor unit.
//!
//! # Examples
//!
//! ```
//! use limitgate_core::types::{Token, TokenType, Transfer, TransferType, User};
//!
//! let transfer = Transfer {
//!     id: 7,
//!     amount: 250,
//!     transfer_type: TransferType::Payment,
//!     token: Some(Token::new("SARAFU", TokenType::Reserve)),
//!     sender: Some(User::new(1)),
//!     ..Default::default()
//! };
//!
//! assert_eq!(transfer.sender_id(), Some(1));
//! assert_eq!(transfer.token_symbol(), "SARAFU");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Identifier of a user account.
pub type UserId = u64;

/// Identifier of a transfer.
pub type TransferId = u64;

/// An amount of token in its minor unit.
pub type Amount = i64;

/// Error returned when parsing one of the classification enums from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Generates `as_str`, `Display` and `FromStr` for a fieldless enum whose
/// text form is the SCREAMING_SNAKE_CASE serde name.
macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// All variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the canonical text form.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let upper = s.trim().to_ascii_uppercase();
                match upper.as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant::new($kind, s)),
                }
            }
        }
    };
}

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferType {
    /// User-to-user payment.
    #[default]
    Payment,
    /// Funds entering the system.
    Deposit,
    /// Funds leaving the system.
    Withdrawal,
}

text_enum!(TransferType, "transfer type", {
    Payment => "PAYMENT",
    Deposit => "DEPOSIT",
    Withdrawal => "WITHDRAWAL",
});

/// Refinement of a transfer's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferSubtype {
    /// Ordinary transfer.
    Standard,
    /// Cash handed to an agent in exchange for tokens.
    AgentIn,
    /// Tokens handed to an agent in exchange for cash.
    AgentOut,
    /// Funds reclaimed by the platform.
    Reclamation,
}

text_enum!(TransferSubtype, "transfer subtype", {
    Standard => "STANDARD",
    AgentIn => "AGENT_IN",
    AgentOut => "AGENT_OUT",
    Reclamation => "RECLAMATION",
});

/// Lifecycle status of a transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    /// Submitted, not yet resolved.
    #[default]
    Pending,
    /// Executed.
    Complete,
    /// Refused; never counts towards limits.
    Rejected,
}

text_enum!(TransferStatus, "transfer status", {
    Pending => "PENDING",
    Complete => "COMPLETE",
    Rejected => "REJECTED",
});

/// Token category. Liquid tokens carry stricter withdrawal controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    /// Community/liquid token.
    Liquid,
    /// Reserve-backed token.
    Reserve,
}

text_enum!(TokenType, "token type", {
    Liquid => "LIQUID",
    Reserve => "RESERVE",
});

/// A token a transfer is denominated in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Token symbol used in user-facing messages.
    pub symbol: String,
    /// Token category.
    pub token_type: TokenType,
}

impl Token {
    /// Creates a token.
    #[must_use]
    pub fn new(symbol: impl Into<String>, token_type: TokenType) -> Self {
        Self {
            symbol: symbol.into(),
            token_type,
        }
    }
}

/// Administrative access tier, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminTier {
    /// Read-only dashboard access.
    View,
    /// Limited administration.
    Subadmin,
    /// Organisation administrator.
    Admin,
    /// Cross-organisation administrator.
    Superadmin,
    /// Platform operator.
    Sempoadmin,
}

impl AdminTier {
    /// Returns the lowercase name used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Subadmin => "subadmin",
            Self::Admin => "admin",
            Self::Superadmin => "superadmin",
            Self::Sempoadmin => "sempoadmin",
        }
    }
}

impl fmt::Display for AdminTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminTier {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "view" => Ok(Self::View),
            "subadmin" => Ok(Self::Subadmin),
            "admin" => Ok(Self::Admin),
            "superadmin" => Ok(Self::Superadmin),
            "sempoadmin" => Ok(Self::Sempoadmin),
            _ => Err(UnknownVariant::new("admin tier", s)),
        }
    }
}

/// Review status of a KYC application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    /// Documents accepted.
    Verified,
    /// Awaiting review.
    Pending,
    /// Documents refused.
    Rejected,
    /// Application not finished.
    Incomplete,
}

/// Kind of entity a KYC application verifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycType {
    /// A natural person.
    Individual,
    /// A registered business.
    Business,
}

/// A single KYC application attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycApplication {
    /// Review status.
    pub status: KycStatus,
    /// Entity kind.
    pub kyc_type: KycType,
    /// Whether more than one identity document was verified.
    #[serde(default)]
    pub multiple_documents_verified: bool,
}

impl KycApplication {
    /// Creates a verified application of the given kind.
    #[must_use]
    pub const fn verified(kyc_type: KycType) -> Self {
        Self {
            status: KycStatus::Verified,
            kyc_type,
            multiple_documents_verified: false,
        }
    }
}

/// Snapshot of the account state the engine reads for a sender or recipient.
///
/// The lifecycle of users is owned elsewhere; the engine never mutates them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account identifier, used to scope historical aggregation.
    pub id: UserId,

    /// Highest administrative tier held, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_tier: Option<AdminTier>,

    /// Non-administrative role names, e.g. `BENEFICIARY` or `VENDOR`.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub roles: BTreeSet<String>,

    /// KYC applications in submission order.
    #[serde(default)]
    pub kyc_applications: Vec<KycApplication>,

    /// Whether the user's phone number has been verified.
    #[serde(default)]
    pub phone_verified: bool,

    /// Whether the account acts on behalf of a savings group.
    #[serde(default)]
    pub has_group_account_role: bool,

    /// Balance when the snapshot was taken. Limits that depend on the
    /// balance read the live value from the history collaborator instead.
    #[serde(default)]
    pub balance: Amount,
}

impl User {
    /// Creates an unverified user with no roles.
    #[must_use]
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Builder method marking the phone number as verified.
    #[must_use]
    pub const fn with_phone_verified(mut self, verified: bool) -> Self {
        self.phone_verified = verified;
        self
    }

    /// Builder method adding a KYC application.
    #[must_use]
    pub fn with_kyc(mut self, application: KycApplication) -> Self {
        self.kyc_applications.push(application);
        self
    }

    /// Builder method setting the administrative tier.
    #[must_use]
    pub const fn with_admin_tier(mut self, tier: AdminTier) -> Self {
        self.admin_tier = Some(tier);
        self
    }

    /// Builder method adding a role name.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Returns `true` if the user holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Builder method setting the group account role.
    #[must_use]
    pub const fn with_group_account_role(mut self, group: bool) -> Self {
        self.has_group_account_role = group;
        self
    }

    /// Builder method setting the snapshot balance.
    #[must_use]
    pub const fn with_balance(mut self, balance: Amount) -> Self {
        self.balance = balance;
        self
    }
}

/// Immutable snapshot of a transfer submitted for limit validation.
///
/// The candidate transfer is expected to already be persisted as
/// [`TransferStatus::Pending`] in the history the engine aggregates over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Transfer identifier.
    pub id: TransferId,

    /// Amount in the token's minor unit.
    pub amount: Amount,

    /// Transfer direction.
    pub transfer_type: TransferType,

    /// Refinement of the direction, if any.
    #[serde(default)]
    pub transfer_subtype: Option<TransferSubtype>,

    /// Token the transfer is denominated in.
    #[serde(default)]
    pub token: Option<Token>,

    /// Sending user, if any.
    #[serde(default)]
    pub sender: Option<User>,

    /// Receiving user, if any.
    #[serde(default)]
    pub recipient: Option<User>,

    /// Creation time.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Lifecycle status.
    #[serde(default)]
    pub status: TransferStatus,

    /// Whether this transfer is ignored by withdrawal aggregation.
    #[serde(default)]
    pub exclude_from_limit_calcs: bool,
}

impl Default for Transfer {
    fn default() -> Self {
        Self {
            id: 0,
            amount: 0,
            transfer_type: TransferType::Payment,
            transfer_subtype: Some(TransferSubtype::Standard),
            token: None,
            sender: None,
            recipient: None,
            created_at: Utc::now(),
            status: TransferStatus::Pending,
            exclude_from_limit_calcs: false,
        }
    }
}

impl Transfer {
    /// Returns the sender's id, if there is a sender.
    #[must_use]
    pub fn sender_id(&self) -> Option<UserId> {
        self.sender.as_ref().map(|u| u.id)
    }

    /// Returns the token symbol, or an empty string when no token is attached.
    #[must_use]
    pub fn token_symbol(&self) -> &str {
        self.token.as_ref().map_or("", |t| t.symbol.as_str())
    }

    /// Returns the token category, if a token is attached.
    #[must_use]
    pub fn token_type(&self) -> Option<TokenType> {
        self.token.as_ref().map(|t| t.token_type)
    }

    /// Returns `true` for withdrawals and agent-out payments.
    #[must_use]
    pub fn is_cash_out(&self) -> bool {
        self.transfer_type == TransferType::Withdrawal
            || self.transfer_subtype == Some(TransferSubtype::AgentOut)
    }
}
