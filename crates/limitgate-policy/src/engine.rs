//! Limit evaluation.
//!
//! The [`LimitEvaluator`] runs every applicable rule of a [`LimitRegistry`]
//! against a transfer, reading aggregates from a [`TransferHistory`].
//!
//! # Evaluation Order
//!
//! Rules are evaluated in registry declaration order and the first
//! violation is returned. [`LimitEvaluator::check_all`] keeps going and
//! collects every violation instead.
//!
//! # Pending Candidates
//!
//! Aggregations subtract the candidate's own contribution, so the candidate
//! must already be recorded in history (normally as pending) when it is
//! validated. A caller that persists rejections should mark the candidate
//! rejected afterwards so it stops counting.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use limitgate_core::config::LimitsConfig;
//! use limitgate_core::types::{Token, TokenType, Transfer, User};
//! use limitgate_policy::engine::{LimitEngine, LimitEvaluator};
//! use limitgate_policy::history::InMemoryHistory;
//! use limitgate_policy::registry::LimitRegistry;
//!
//! let registry = Arc::new(LimitRegistry::from_config(&LimitsConfig::default()).unwrap());
//! let history = InMemoryHistory::new();
//! let evaluator = LimitEvaluator::new(registry, &history);
//!
//! let transfer = Transfer {
//!     id: 1,
//!     amount: 100,
//!     token: Some(Token::new("GE", TokenType::Reserve)),
//!     sender: Some(User::new(7)),
//!     ..Default::default()
//! };
//! history.record(&transfer).unwrap();
//!
//! assert!(evaluator.check(&transfer).unwrap().is_allowed());
//! ```

use chrono::{DateTime, Utc};
use limitgate_core::error::{HistoryError, LimitError, RejectionReason};
use limitgate_core::types::Transfer;
use std::sync::Arc;

use crate::history::TransferHistory;
use crate::limit::LimitRule;
use crate::registry::LimitRegistry;

/// Trait for engines that decide whether a transfer is within its limits.
///
/// All implementations must be `Send + Sync` so one engine can serve
/// concurrent callers.
pub trait LimitEngine: Send + Sync {
    /// Checks a transfer against every applicable limit.
    ///
    /// # Returns
    ///
    /// * `Ok(LimitCheckResult::Allowed)` - every applicable rule passed
    /// * `Ok(LimitCheckResult::Rejected(reason))` - the first violated rule
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the history collaborator fails. A failure
    /// is never reported as a rejection.
    fn check(&self, transfer: &Transfer) -> Result<LimitCheckResult, HistoryError>;
}

/// Outcome of a limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitCheckResult {
    /// Every applicable rule passed.
    Allowed,

    /// A rule was violated.
    Rejected(RejectionReason),
}

impl LimitCheckResult {
    /// Returns `true` if the transfer is allowed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Returns `true` if the transfer was rejected.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        !self.is_allowed()
    }

    /// Returns the name of the violated rule, if any.
    #[must_use]
    pub fn rule_name(&self) -> Option<&str> {
        match self {
            Self::Allowed => None,
            Self::Rejected(reason) => Some(reason.limit_name()),
        }
    }

    /// Returns a human-readable rejection message, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Allowed => None,
            Self::Rejected(reason) => Some(reason.to_string()),
        }
    }
}

impl From<LimitCheckResult> for Result<(), RejectionReason> {
    fn from(result: LimitCheckResult) -> Self {
        match result {
            LimitCheckResult::Allowed => Ok(()),
            LimitCheckResult::Rejected(reason) => Err(reason),
        }
    }
}

/// Evaluates transfers against a shared registry and a history collaborator.
#[derive(Debug)]
pub struct LimitEvaluator<H> {
    registry: Arc<LimitRegistry>,
    history: H,
}

impl<H: TransferHistory> LimitEvaluator<H> {
    /// Creates an evaluator.
    #[must_use]
    pub fn new(registry: Arc<LimitRegistry>, history: H) -> Self {
        Self { registry, history }
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &LimitRegistry {
        &self.registry
    }

    /// Returns the history collaborator.
    #[must_use]
    pub const fn history(&self) -> &H {
        &self.history
    }

    /// Returns the rules that apply to `transfer`, in declaration order.
    ///
    /// Empty when an admin at or above the registry's floor is involved.
    #[must_use]
    pub fn get_applicable_limits(&self, transfer: &Transfer) -> Vec<&LimitRule> {
        self.registry.applicable(transfer)
    }

    /// Validates `transfer` as of now.
    ///
    /// # Errors
    ///
    /// Returns [`LimitError::Rejected`] with the first violation, or
    /// [`LimitError::History`] if the collaborator fails.
    pub fn validate_transfer(&self, transfer: &Transfer) -> Result<(), LimitError> {
        self.validate_transfer_at(transfer, Utc::now())
    }

    /// Validates `transfer` with windows ending at `now`.
    ///
    /// # Errors
    ///
    /// See [`LimitEvaluator::validate_transfer`].
    pub fn validate_transfer_at(
        &self,
        transfer: &Transfer,
        now: DateTime<Utc>,
    ) -> Result<(), LimitError> {
        let applicable = self.get_applicable_limits(transfer);
        tracing::debug!(
            transfer_id = transfer.id,
            applicable = applicable.len(),
            "Evaluating transfer limits"
        );

        for rule in applicable {
            tracing::debug!(transfer_id = transfer.id, limit = %rule, "Checking limit");
            if let Err(e) = rule.validate(transfer, &self.history, now) {
                log_failure(transfer, &e);
                return Err(e);
            }
        }

        tracing::info!(
            transfer_id = transfer.id,
            amount = transfer.amount,
            token = transfer.token_symbol(),
            "Transfer within limits"
        );
        Ok(())
    }

    /// Collects every violation as of now.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the collaborator fails.
    pub fn check_all(&self, transfer: &Transfer) -> Result<Vec<RejectionReason>, HistoryError> {
        self.check_all_at(transfer, Utc::now())
    }

    /// Collects every violation with windows ending at `now`, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the collaborator fails.
    pub fn check_all_at(
        &self,
        transfer: &Transfer,
        now: DateTime<Utc>,
    ) -> Result<Vec<RejectionReason>, HistoryError> {
        let mut violations = Vec::new();
        for rule in self.get_applicable_limits(transfer) {
            match rule.validate(transfer, &self.history, now) {
                Ok(()) => {}
                Err(LimitError::Rejected(reason)) => violations.push(reason),
                Err(LimitError::History(e)) => return Err(e),
            }
        }
        Ok(violations)
    }
}

impl<H: TransferHistory> LimitEngine for LimitEvaluator<H> {
    fn check(&self, transfer: &Transfer) -> Result<LimitCheckResult, HistoryError> {
        match self.validate_transfer(transfer) {
            Ok(()) => Ok(LimitCheckResult::Allowed),
            Err(LimitError::Rejected(reason)) => Ok(LimitCheckResult::Rejected(reason)),
            Err(LimitError::History(e)) => Err(e),
        }
    }
}

fn log_failure(transfer: &Transfer, error: &LimitError) {
    match error {
        LimitError::Rejected(reason) => tracing::warn!(
            transfer_id = transfer.id,
            sender_id = ?transfer.sender_id(),
            amount = transfer.amount,
            limit = reason.limit_name(),
            kind = reason.kind(),
            available = ?reason.available(),
            "Transfer rejected"
        ),
        LimitError::History(e) => tracing::warn!(
            transfer_id = transfer.id,
            error = %e,
            "Limit evaluation failed"
        ),
    }
}
