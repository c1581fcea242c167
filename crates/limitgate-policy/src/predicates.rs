//! Eligibility predicates.
//!
//! Pure functions classifying a transfer and its sender. Every predicate is
//! total: missing sender or token data yields `false`, never an error.
//!
//! Composite predicates are exposed as the closed [`Eligibility`] enum so a
//! rule's applicability criteria stay plain data.

use limitgate_core::types::{AdminTier, KycStatus, KycType, TokenType, Transfer, User};
use serde::Serialize;
use std::fmt;

/// Returns `true` if the sender or recipient holds an admin tier at or above `floor`.
///
/// Such transfers are exempt from every limit.
#[must_use]
pub fn sempo_admin_involved(transfer: &Transfer, floor: AdminTier) -> bool {
    let at_or_above = |user: &Option<User>| {
        user.as_ref()
            .and_then(|u| u.admin_tier)
            .is_some_and(|tier| tier >= floor)
    };
    at_or_above(&transfer.recipient) || at_or_above(&transfer.sender)
}

/// Returns `true` if the transfer has a sender.
#[must_use]
pub const fn sender_exists(transfer: &Transfer) -> bool {
    transfer.sender.is_some()
}

/// Returns `true` if the transfer is denominated in a liquid token.
#[must_use]
pub fn token_is_liquid(transfer: &Transfer) -> bool {
    transfer.token_type() == Some(TokenType::Liquid)
}

/// Returns `true` if the transfer is denominated in a reserve token.
#[must_use]
pub fn token_is_reserve(transfer: &Transfer) -> bool {
    transfer.token_type() == Some(TokenType::Reserve)
}

/// Returns `true` if the sender acts for a savings group.
#[must_use]
pub fn sender_has_group_role(transfer: &Transfer) -> bool {
    transfer
        .sender
        .as_ref()
        .is_some_and(|u| u.has_group_account_role)
}

/// Returns `true` if the sender's phone number is verified.
#[must_use]
pub fn sender_phone_verified(transfer: &Transfer) -> bool {
    transfer.sender.as_ref().is_some_and(|u| u.phone_verified)
}

fn sender_has_application(transfer: &Transfer, criteria: impl Fn(KycType, bool) -> bool) -> bool {
    transfer.sender.as_ref().is_some_and(|u| {
        u.kyc_applications.iter().any(|app| {
            app.status == KycStatus::Verified
                && criteria(app.kyc_type, app.multiple_documents_verified)
        })
    })
}

/// Some application is verified, individual and single-document.
#[must_use]
pub fn individual_kyc_verified(transfer: &Transfer) -> bool {
    sender_has_application(transfer, |kind, multidoc| {
        kind == KycType::Individual && !multidoc
    })
}

/// Some application is verified and either a business or multi-document.
#[must_use]
pub fn business_or_multidoc_kyc_verified(transfer: &Transfer) -> bool {
    sender_has_application(transfer, |kind, multidoc| {
        kind == KycType::Business || multidoc
    })
}

/// Effective verification tier of a sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationTier {
    /// No phone or KYC verification.
    Unverified,
    /// Phone verified, no KYC.
    PhoneVerified,
    /// Individual KYC.
    KycVerified,
    /// Business or multi-document KYC.
    BusinessVerified,
}

impl VerificationTier {
    /// Returns the numeric level used in limit names (`Sempo Level N`).
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Unverified => 0,
            Self::PhoneVerified => 1,
            Self::KycVerified => 2,
            Self::BusinessVerified => 3,
        }
    }
}

/// Resolves the sender's single effective tier.
///
/// Precedence is business over individual over phone, so exactly one tier
/// holds even when KYC records disagree. Returns `None` without a sender.
#[must_use]
pub fn verification_tier(transfer: &Transfer) -> Option<VerificationTier> {
    transfer.sender.as_ref()?;

    let tier = if business_or_multidoc_kyc_verified(transfer) {
        VerificationTier::BusinessVerified
    } else if individual_kyc_verified(transfer) {
        VerificationTier::KycVerified
    } else if sender_phone_verified(transfer) {
        VerificationTier::PhoneVerified
    } else {
        VerificationTier::Unverified
    };
    Some(tier)
}

/// Composite applicability predicate attached to a limit rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    /// Unverified sender, liquid or reserve token.
    UnverifiedAnyToken,
    /// Phone-verified sender without KYC, liquid or reserve token.
    PhoneVerifiedAnyToken,
    /// Individually KYC-verified sender, liquid or reserve token.
    KycVerifiedAnyToken,
    /// Business or multi-document verified sender, liquid or reserve token.
    BusinessVerifiedAnyToken,
    /// Non-group sender, liquid token.
    StandardUserLiquidToken,
    /// Group-account sender, liquid token.
    GroupAccountLiquidToken,
    /// Any sender, liquid or reserve token.
    AnyUserAnyToken,
}

impl Eligibility {
    /// All variants, in declaration order.
    pub const ALL: &'static [Self] = &[
        Self::UnverifiedAnyToken,
        Self::PhoneVerifiedAnyToken,
        Self::KycVerifiedAnyToken,
        Self::BusinessVerifiedAnyToken,
        Self::StandardUserLiquidToken,
        Self::GroupAccountLiquidToken,
        Self::AnyUserAnyToken,
    ];

    /// Evaluates the predicate.
    ///
    /// Every variant requires a sender and no admin at or above `admin_floor`.
    ///
    /// # Examples
    ///
    /// ```
    /// use limitgate_core::types::{AdminTier, Token, TokenType, Transfer, User};
    /// use limitgate_policy::predicates::Eligibility;
    ///
    /// let transfer = Transfer {
    ///     token: Some(Token::new("GE", TokenType::Liquid)),
    ///     sender: Some(User::new(1).with_phone_verified(true)),
    ///     ..Default::default()
    /// };
    ///
    /// assert!(Eligibility::PhoneVerifiedAnyToken.matches(&transfer, AdminTier::Sempoadmin));
    /// assert!(Eligibility::StandardUserLiquidToken.matches(&transfer, AdminTier::Sempoadmin));
    /// assert!(!Eligibility::UnverifiedAnyToken.matches(&transfer, AdminTier::Sempoadmin));
    /// ```
    #[must_use]
    pub fn matches(self, transfer: &Transfer, admin_floor: AdminTier) -> bool {
        if !sender_exists(transfer) || sempo_admin_involved(transfer, admin_floor) {
            return false;
        }

        let any_token = token_is_liquid(transfer) || token_is_reserve(transfer);
        let tier = verification_tier(transfer);

        match self {
            Self::UnverifiedAnyToken => any_token && tier == Some(VerificationTier::Unverified),
            Self::PhoneVerifiedAnyToken => {
                any_token && tier == Some(VerificationTier::PhoneVerified)
            }
            Self::KycVerifiedAnyToken => any_token && tier == Some(VerificationTier::KycVerified),
            Self::BusinessVerifiedAnyToken => {
                any_token && tier == Some(VerificationTier::BusinessVerified)
            }
            Self::StandardUserLiquidToken => {
                token_is_liquid(transfer) && !sender_has_group_role(transfer)
            }
            Self::GroupAccountLiquidToken => {
                token_is_liquid(transfer) && sender_has_group_role(transfer)
            }
            Self::AnyUserAnyToken => any_token,
        }
    }

    /// Returns the snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnverifiedAnyToken => "unverified_any_token",
            Self::PhoneVerifiedAnyToken => "phone_verified_any_token",
            Self::KycVerifiedAnyToken => "kyc_verified_any_token",
            Self::BusinessVerifiedAnyToken => "business_verified_any_token",
            Self::StandardUserLiquidToken => "standard_user_liquid_token",
            Self::GroupAccountLiquidToken => "group_account_liquid_token",
            Self::AnyUserAnyToken => "any_user_any_token",
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
