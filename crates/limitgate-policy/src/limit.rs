//! Limit rules.
//!
//! A [`LimitRule`] binds a name and applicability criteria to one
//! [`LimitKind`]. Every kind answers two questions about a transfer: how
//! much capacity is available, and how much this transfer would consume.
//! A transfer passes when `available >= case_will_use`.
//!
//! | Kind | available | case_will_use |
//! |---|---|---|
//! | `NoTransferAllowed` | 0 | 1 |
//! | `MaxPerTransfer` | maximum | amount |
//! | `TotalAmount` | total - used | amount |
//! | `MinimumSent` | reference sum - used | amount |
//! | `BalanceFraction` | fraction x balance - used | amount |
//! | `TransferCount` | count - used count | 1 |
//!
//! `used` excludes the candidate itself, which is already in history as a
//! pending transfer.

use chrono::{DateTime, Utc};
use limitgate_core::error::{HistoryError, LimitError, RejectionReason};
use limitgate_core::types::{AdminTier, Amount, Transfer, TransferSubtype, TransferType};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::filter::{FilterSpec, Reducer, Refinement};
use crate::history::{TransferHistory, TransferRecord};
use crate::predicates::Eligibility;

/// Transfer classification a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selector {
    /// Any transfer of this type.
    Type {
        /// Matched type.
        transfer_type: TransferType,
    },
    /// Transfers of exactly this type and subtype.
    TypeAndSubtype {
        /// Matched type.
        transfer_type: TransferType,
        /// Matched subtype.
        transfer_subtype: TransferSubtype,
    },
}

impl Selector {
    /// Selects a transfer type.
    #[must_use]
    pub const fn of_type(transfer_type: TransferType) -> Self {
        Self::Type { transfer_type }
    }

    /// Selects a payment subtype.
    #[must_use]
    pub const fn payment(transfer_subtype: TransferSubtype) -> Self {
        Self::TypeAndSubtype {
            transfer_type: TransferType::Payment,
            transfer_subtype,
        }
    }

    /// Returns `true` if the transfer's classification matches exactly.
    #[must_use]
    pub fn matches(&self, transfer: &Transfer) -> bool {
        match *self {
            Self::Type { transfer_type } => transfer.transfer_type == transfer_type,
            Self::TypeAndSubtype {
                transfer_type,
                transfer_subtype,
            } => {
                transfer.transfer_type == transfer_type
                    && transfer.transfer_subtype == Some(transfer_subtype)
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type { transfer_type } => write!(f, "{transfer_type}"),
            Self::TypeAndSubtype {
                transfer_type,
                transfer_subtype,
            } => write!(f, "{transfer_type}/{transfer_subtype}"),
        }
    }
}

/// The variant-specific parameters of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LimitKind {
    /// Always refuses.
    NoTransferAllowed,

    /// Fixed ceiling per transfer.
    MaxPerTransfer {
        /// Ceiling in minor units.
        maximum: Amount,
    },

    /// Fixed ceiling on the window total.
    TotalAmount {
        /// Ceiling in minor units.
        total: Amount,
        /// Window length.
        window_days: u32,
        /// Which past transfers count.
        refinement: Refinement,
    },

    /// Window total may not exceed the window total of reference activity.
    MinimumSent {
        /// Window length.
        window_days: u32,
        /// Which past transfers count as used.
        refinement: Refinement,
        /// Which past transfers form the reference total.
        reference: Refinement,
    },

    /// Window total may not exceed a fraction of the live balance.
    BalanceFraction {
        /// Fraction in `(0, 1]`.
        fraction: Decimal,
        /// Window length.
        window_days: u32,
        /// Which past transfers count.
        refinement: Refinement,
    },

    /// Ceiling on the number of transfers in the window.
    TransferCount {
        /// Allowed transfers.
        count: u32,
        /// Window length.
        window_days: u32,
        /// Which past transfers count.
        refinement: Refinement,
    },
}

impl LimitKind {
    /// Returns the snake-case name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoTransferAllowed => "no_transfer_allowed",
            Self::MaxPerTransfer { .. } => "max_per_transfer",
            Self::TotalAmount { .. } => "total_amount",
            Self::MinimumSent { .. } => "minimum_sent",
            Self::BalanceFraction { .. } => "balance_fraction",
            Self::TransferCount { .. } => "transfer_count",
        }
    }

    /// Returns the aggregation window, if the kind has one.
    #[must_use]
    pub const fn window_days(&self) -> Option<u32> {
        match self {
            Self::NoTransferAllowed | Self::MaxPerTransfer { .. } => None,
            Self::TotalAmount { window_days, .. }
            | Self::MinimumSent { window_days, .. }
            | Self::BalanceFraction { window_days, .. }
            | Self::TransferCount { window_days, .. } => Some(*window_days),
        }
    }
}

/// A configured limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitRule {
    name: String,
    selectors: Vec<Selector>,
    eligibility: Eligibility,
    #[serde(flatten)]
    kind: LimitKind,
}

impl LimitRule {
    /// Creates a rule. Validation happens when the rule joins a registry.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        selectors: Vec<Selector>,
        eligibility: Eligibility,
        kind: LimitKind,
    ) -> Self {
        Self {
            name: name.into(),
            selectors,
            eligibility,
            kind,
        }
    }

    /// Returns the rule's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the selectors.
    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Returns the eligibility predicate.
    #[must_use]
    pub const fn eligibility(&self) -> Eligibility {
        self.eligibility
    }

    /// Returns the kind and its parameters.
    #[must_use]
    pub const fn kind(&self) -> &LimitKind {
        &self.kind
    }

    /// Returns `true` if a selector matches and the eligibility predicate holds.
    #[must_use]
    pub fn applies_to(&self, transfer: &Transfer, admin_floor: AdminTier) -> bool {
        self.selectors.iter().any(|s| s.matches(transfer))
            && self.eligibility.matches(transfer, admin_floor)
    }

    /// Returns how much of the limit the transfer would consume.
    #[must_use]
    pub const fn case_will_use(&self, transfer: &Transfer) -> i64 {
        match self.kind {
            LimitKind::NoTransferAllowed | LimitKind::TransferCount { .. } => 1,
            LimitKind::MaxPerTransfer { .. }
            | LimitKind::TotalAmount { .. }
            | LimitKind::MinimumSent { .. }
            | LimitKind::BalanceFraction { .. } => transfer.amount,
        }
    }

    /// Returns the remaining capacity as of `now`. May be negative.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if an aggregation fails.
    pub fn available<H>(
        &self,
        transfer: &Transfer,
        history: &H,
        now: DateTime<Utc>,
    ) -> Result<i64, HistoryError>
    where
        H: TransferHistory + ?Sized,
    {
        let available = match self.kind {
            LimitKind::NoTransferAllowed => 0,
            LimitKind::MaxPerTransfer { maximum } => maximum,
            LimitKind::TotalAmount {
                total,
                window_days,
                refinement,
            } => total.saturating_sub(used_amount(
                transfer,
                window_days,
                refinement,
                history,
                now,
            )?),
            LimitKind::MinimumSent {
                window_days,
                refinement,
                reference,
            } => {
                let base = history.aggregate(
                    &FilterSpec::for_transfer(transfer, window_days, reference, now),
                    Reducer::Sum,
                )?;
                base.saturating_sub(used_amount(
                    transfer,
                    window_days,
                    refinement,
                    history,
                    now,
                )?)
            }
            LimitKind::BalanceFraction {
                fraction,
                window_days,
                refinement,
            } => {
                let balance = match transfer.sender_id() {
                    Some(id) => history.current_balance(id)?,
                    None => 0,
                };
                fraction_of(fraction, balance).saturating_sub(used_amount(
                    transfer,
                    window_days,
                    refinement,
                    history,
                    now,
                )?)
            }
            LimitKind::TransferCount {
                count,
                window_days,
                refinement,
            } => i64::from(count).saturating_sub(used_count(
                transfer,
                window_days,
                refinement,
                history,
                now,
            )?),
        };
        Ok(available)
    }

    /// Validates the transfer against this rule as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`LimitError::Rejected`] if the transfer needs more than is
    /// available, or [`LimitError::History`] if an aggregation fails.
    pub fn validate<H>(
        &self,
        transfer: &Transfer,
        history: &H,
        now: DateTime<Utc>,
    ) -> Result<(), LimitError>
    where
        H: TransferHistory + ?Sized,
    {
        let available = self.available(transfer, history, now)?;
        if available < self.case_will_use(transfer) {
            return Err(self.rejection(transfer, available, history, now)?.into());
        }
        Ok(())
    }

    fn rejection<H>(
        &self,
        transfer: &Transfer,
        available: i64,
        history: &H,
        now: DateTime<Utc>,
    ) -> Result<RejectionReason, HistoryError>
    where
        H: TransferHistory + ?Sized,
    {
        let limit = self.name.clone();
        let token = transfer.token_symbol().to_string();

        let reason = match self.kind {
            LimitKind::NoTransferAllowed => RejectionReason::NoTransferAllowed { limit, token },
            LimitKind::MaxPerTransfer { maximum } => RejectionReason::MaxPerTransferExceeded {
                limit,
                maximum,
                amount: transfer.amount,
                token,
            },
            LimitKind::TotalAmount {
                total, window_days, ..
            } => RejectionReason::TotalAmountExceeded {
                limit,
                total,
                available,
                window_days,
                token,
            },
            LimitKind::MinimumSent {
                window_days,
                reference,
                ..
            } => RejectionReason::MinimumSentNotMet {
                limit,
                reference_total: history.aggregate(
                    &FilterSpec::for_transfer(transfer, window_days, reference, now),
                    Reducer::Sum,
                )?,
                available,
                window_days,
                token,
            },
            LimitKind::BalanceFraction {
                fraction,
                window_days,
                ..
            } => RejectionReason::BalanceFractionExceeded {
                limit,
                fraction,
                available,
                window_days,
                token,
            },
            LimitKind::TransferCount {
                count, window_days, ..
            } => RejectionReason::TransferCountExceeded {
                limit,
                count,
                window_days,
                token,
            },
        };
        Ok(reason)
    }
}

impl fmt::Display for LimitRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind.as_str())
    }
}

/// Window total of matching transfers, minus the candidate's own amount
/// when the candidate is itself inside the window.
fn used_amount<H>(
    transfer: &Transfer,
    window_days: u32,
    refinement: Refinement,
    history: &H,
    now: DateTime<Utc>,
) -> Result<Amount, HistoryError>
where
    H: TransferHistory + ?Sized,
{
    let filter = FilterSpec::for_transfer(transfer, window_days, refinement, now);
    let total = history.aggregate(&filter, Reducer::Sum)?;
    if counts_itself(&filter, transfer) {
        Ok(total.saturating_sub(transfer.amount))
    } else {
        Ok(total)
    }
}

/// Window count of matching transfers, minus the candidate if it is one.
fn used_count<H>(
    transfer: &Transfer,
    window_days: u32,
    refinement: Refinement,
    history: &H,
    now: DateTime<Utc>,
) -> Result<i64, HistoryError>
where
    H: TransferHistory + ?Sized,
{
    let filter = FilterSpec::for_transfer(transfer, window_days, refinement, now);
    let count = history.aggregate(&filter, Reducer::Count)?;
    if counts_itself(&filter, transfer) {
        Ok(count.saturating_sub(1))
    } else {
        Ok(count)
    }
}

/// Whether the recorded candidate falls inside its own aggregate.
///
/// A backdated candidate, or one excluded from limit calculations, was never
/// summed and must not be subtracted.
fn counts_itself(filter: &FilterSpec, transfer: &Transfer) -> bool {
    filter.matches(&TransferRecord::from(transfer))
}

/// `fraction * balance`, truncated toward zero.
fn fraction_of(fraction: Decimal, balance: Amount) -> Amount {
    // |fraction| <= 1 keeps the product inside i64
    (fraction * Decimal::from(balance))
        .trunc()
        .to_i64()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::unreadable_literal
    )]

    use super::*;
    use crate::history::InMemoryHistory;
    use chrono::Duration;
    use limitgate_core::types::{Token, TokenType, TransferStatus, User};

    const FLOOR: AdminTier = AdminTier::Sempoadmin;

    fn rule(kind: LimitKind) -> LimitRule {
        LimitRule::new(
            "Test Limit",
            vec![Selector::of_type(TransferType::Payment)],
            Eligibility::AnyUserAnyToken,
            kind,
        )
    }

    fn transfer(id: u64, amount: Amount) -> Transfer {
        Transfer {
            id,
            amount,
            token: Some(Token::new("SARAFU", TokenType::Reserve)),
            sender: Some(User::new(1)),
            ..Default::default()
        }
    }

    /// Records `transfer` as pending, mirroring how callers submit candidates.
    fn submit(history: &InMemoryHistory, transfer: &Transfer) {
        history.record(transfer).unwrap();
    }

    fn past(history: &InMemoryHistory, id: u64, amount: Amount, age_days: i64) {
        let mut t = transfer(id, amount);
        t.status = TransferStatus::Complete;
        t.created_at = Utc::now() - Duration::days(age_days);
        history.record(&t).unwrap();
    }

    // =========================================================================
    // Selectors and applicability
    // =========================================================================

    #[test]
    fn test_selector_matching_is_exact() {
        let agent_out = Transfer {
            transfer_subtype: Some(TransferSubtype::AgentOut),
            ..Default::default()
        };
        assert!(Selector::payment(TransferSubtype::AgentOut).matches(&agent_out));
        assert!(!Selector::payment(TransferSubtype::Standard).matches(&agent_out));
        assert!(Selector::of_type(TransferType::Payment).matches(&agent_out));
        assert!(!Selector::of_type(TransferType::Withdrawal).matches(&agent_out));

        let no_subtype = Transfer {
            transfer_subtype: None,
            ..Default::default()
        };
        assert!(!Selector::payment(TransferSubtype::Standard).matches(&no_subtype));
    }

    #[test]
    fn test_applies_to_requires_selector_and_eligibility() {
        let r = rule(LimitKind::NoTransferAllowed);
        assert!(r.applies_to(&transfer(1, 10), FLOOR));

        let mut withdrawal = transfer(1, 10);
        withdrawal.transfer_type = TransferType::Withdrawal;
        assert!(!r.applies_to(&withdrawal, FLOOR));

        let mut no_token = transfer(1, 10);
        no_token.token = None;
        assert!(!r.applies_to(&no_token, FLOOR));
    }

    // =========================================================================
    // Kinds
    // =========================================================================

    #[test]
    fn test_no_transfer_allowed_always_rejects() {
        let history = InMemoryHistory::new();
        let t = transfer(1, 0);
        let err = rule(LimitKind::NoTransferAllowed)
            .validate(&t, &history, Utc::now())
            .unwrap_err();
        let reason = err.rejection().unwrap();
        assert_eq!(reason.kind(), "no_transfer_allowed");
        assert_eq!(reason.token(), "SARAFU");
    }

    #[test]
    fn test_max_per_transfer_boundary() {
        let history = InMemoryHistory::new();
        let r = rule(LimitKind::MaxPerTransfer { maximum: 500 });

        assert!(r.validate(&transfer(1, 500), &history, Utc::now()).is_ok());

        let err = r
            .validate(&transfer(2, 501), &history, Utc::now())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Maximum Per Transfer Exceeded (Limit Test Limit). 500 SARAFU available"
        );
    }

    #[test]
    fn test_total_amount_subtracts_own_amount() {
        let history = InMemoryHistory::new();
        past(&history, 1, 300, 2);
        let r = rule(LimitKind::TotalAmount {
            total: 1000,
            window_days: 7,
            refinement: Refinement::MatchingTransferType,
        });

        let ok = transfer(2, 700);
        submit(&history, &ok);
        assert_eq!(r.available(&ok, &history, Utc::now()).unwrap(), 700);
        assert!(r.validate(&ok, &history, Utc::now()).is_ok());

        history.set_status(2, TransferStatus::Complete).unwrap();
        let over = transfer(3, 1);
        submit(&history, &over);
        let err = r.validate(&over, &history, Utc::now()).unwrap_err();
        let reason = err.rejection().unwrap();
        assert_eq!(reason.available(), Some(0));
        assert_eq!(reason.window_days(), Some(7));
    }

    #[test]
    fn test_total_amount_ignores_transfers_outside_window() {
        let history = InMemoryHistory::new();
        past(&history, 1, 900, 8);
        let r = rule(LimitKind::TotalAmount {
            total: 1000,
            window_days: 7,
            refinement: Refinement::MatchingTransferType,
        });

        let t = transfer(2, 1000);
        submit(&history, &t);
        assert!(r.validate(&t, &history, Utc::now()).is_ok());
    }

    #[test]
    fn test_backdated_candidate_is_not_subtracted() {
        let history = InMemoryHistory::new();
        past(&history, 1, 1000, 2);
        let r = rule(LimitKind::TotalAmount {
            total: 1000,
            window_days: 7,
            refinement: Refinement::MatchingTransferType,
        });

        let mut backdated = transfer(2, 500);
        backdated.created_at = Utc::now() - Duration::days(8);
        submit(&history, &backdated);

        assert_eq!(r.available(&backdated, &history, Utc::now()).unwrap(), 0);
        let err = r.validate(&backdated, &history, Utc::now()).unwrap_err();
        assert_eq!(err.rejection().unwrap().available(), Some(0));
    }

    #[test]
    fn test_excluded_candidate_is_not_subtracted() {
        let history = InMemoryHistory::new();
        let mut prior = transfer(1, 400);
        prior.transfer_type = TransferType::Withdrawal;
        prior.status = TransferStatus::Complete;
        history.record(&prior).unwrap();

        let r = LimitRule::new(
            "Test Limit",
            vec![Selector::of_type(TransferType::Withdrawal)],
            Eligibility::AnyUserAnyToken,
            LimitKind::TotalAmount {
                total: 1000,
                window_days: 7,
                refinement: Refinement::WithdrawalOrAgentOutNotExcluded,
            },
        );

        let mut excluded = transfer(2, 700);
        excluded.transfer_type = TransferType::Withdrawal;
        excluded.exclude_from_limit_calcs = true;
        submit(&history, &excluded);

        assert_eq!(r.available(&excluded, &history, Utc::now()).unwrap(), 600);
        assert!(r.validate(&excluded, &history, Utc::now()).is_err());
    }

    #[test]
    fn test_backdated_candidate_counts_prior_transfers_only() {
        let history = InMemoryHistory::new();
        past(&history, 1, 10, 1);
        let r = rule(LimitKind::TransferCount {
            count: 1,
            window_days: 30,
            refinement: Refinement::MatchingTransferType,
        });

        let mut backdated = transfer(2, 10);
        backdated.created_at = Utc::now() - Duration::days(31);
        submit(&history, &backdated);

        assert!(r.validate(&backdated, &history, Utc::now()).is_err());
    }

    #[test]
    fn test_total_amount_negative_available_is_clamped_in_message() {
        let history = InMemoryHistory::new();
        past(&history, 1, 1500, 1);
        let r = rule(LimitKind::TotalAmount {
            total: 1000,
            window_days: 7,
            refinement: Refinement::MatchingTransferType,
        });

        let t = transfer(2, 10);
        submit(&history, &t);
        let err = r.validate(&t, &history, Utc::now()).unwrap_err();
        assert_eq!(err.rejection().unwrap().available(), Some(-500));
        assert_eq!(
            err.to_string(),
            "Account Limit \"Test Limit\" reached. 0 SARAFU available"
        );
    }

    #[test]
    fn test_minimum_sent_uses_reference_activity() {
        let history = InMemoryHistory::new();
        past(&history, 1, 400, 3);

        let r = LimitRule::new(
            "Cash out",
            vec![Selector::of_type(TransferType::Withdrawal)],
            Eligibility::AnyUserAnyToken,
            LimitKind::MinimumSent {
                window_days: 30,
                refinement: Refinement::WithdrawalOrAgentOutNotExcluded,
                reference: Refinement::StandardSubtype,
            },
        );

        let mut withdrawal = transfer(2, 400);
        withdrawal.transfer_type = TransferType::Withdrawal;
        withdrawal.transfer_subtype = None;
        submit(&history, &withdrawal);
        assert!(r.validate(&withdrawal, &history, Utc::now()).is_ok());

        let mut more = withdrawal.clone();
        more.id = 3;
        more.amount = 1;
        submit(&history, &more);
        let err = r.validate(&more, &history, Utc::now()).unwrap_err();
        match err.rejection().unwrap() {
            RejectionReason::MinimumSentNotMet {
                reference_total,
                available,
                ..
            } => {
                assert_eq!(*reference_total, 400);
                assert_eq!(*available, 0);
            }
            other => panic!("unexpected rejection {other:?}"),
        }
    }

    #[test]
    fn test_balance_fraction_reads_live_balance() {
        let history = InMemoryHistory::new();
        history.set_balance(1, 500).unwrap();
        let r = rule(LimitKind::BalanceFraction {
            fraction: Decimal::new(5, 1),
            window_days: 30,
            refinement: Refinement::MatchingTransferType,
        });

        let ok = transfer(1, 250);
        submit(&history, &ok);
        assert!(r.validate(&ok, &history, Utc::now()).is_ok());

        let over = transfer(1, 251);
        submit(&history, &over);
        let err = r.validate(&over, &history, Utc::now()).unwrap_err();
        assert!(err.to_string().starts_with("Account % Limit \"Test Limit\" reached."));

        history.set_balance(1, 400).unwrap();
        let after_drop = transfer(1, 250);
        submit(&history, &after_drop);
        assert!(r.validate(&after_drop, &history, Utc::now()).is_err());
    }

    #[test]
    fn test_fraction_of_truncates() {
        assert_eq!(fraction_of(Decimal::new(5, 1), 501), 250);
        assert_eq!(fraction_of(Decimal::new(5, 1), -3), -1);
        assert_eq!(fraction_of(Decimal::ONE, i64::MAX), i64::MAX);
    }

    #[test]
    fn test_transfer_count_boundary() {
        let history = InMemoryHistory::new();
        let r = rule(LimitKind::TransferCount {
            count: 2,
            window_days: 30,
            refinement: Refinement::MatchingTransferType,
        });

        for id in 1..=2 {
            let t = transfer(id, 10);
            submit(&history, &t);
            assert!(r.validate(&t, &history, Utc::now()).is_ok(), "transfer {id}");
            history.set_status(id, TransferStatus::Complete).unwrap();
        }

        let third = transfer(3, 10);
        submit(&history, &third);
        let err = r.validate(&third, &history, Utc::now()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Account Limit \"Test Limit\" reached. Allowed 2 SARAFU transaction(s) per 30 days"
        );
    }

    #[test]
    fn test_history_failure_is_not_a_rejection() {
        struct Broken;
        impl TransferHistory for Broken {
            fn aggregate(&self, _: &FilterSpec, _: Reducer) -> Result<i64, HistoryError> {
                Err(HistoryError::storage("down"))
            }
            fn current_balance(&self, _: u64) -> Result<Amount, HistoryError> {
                Err(HistoryError::storage("down"))
            }
        }

        let r = rule(LimitKind::TransferCount {
            count: 1,
            window_days: 30,
            refinement: Refinement::MatchingTransferType,
        });
        let err = r.validate(&transfer(1, 1), &Broken, Utc::now()).unwrap_err();
        assert!(matches!(err, LimitError::History(_)));

        let max = rule(LimitKind::MaxPerTransfer { maximum: 10 });
        assert!(max.validate(&transfer(1, 1), &Broken, Utc::now()).is_ok());
    }

    #[test]
    fn test_rule_serializes_flat() {
        let json = serde_json::to_value(rule(LimitKind::MaxPerTransfer { maximum: 5 })).unwrap();
        assert_eq!(json["name"], "Test Limit");
        assert_eq!(json["kind"], "max_per_transfer");
        assert_eq!(json["maximum"], 5);
        assert_eq!(json["eligibility"], "any_user_any_token");
        assert_eq!(json["selectors"][0]["transfer_type"], "PAYMENT");
    }
}
