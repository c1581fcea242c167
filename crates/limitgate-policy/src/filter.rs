//! Historical query construction.
//!
//! A [`FilterSpec`] describes which past transfers an aggregation limit
//! consults: same sender, not rejected, created inside the window, plus one
//! [`Refinement`]. It is plain data, evaluated in memory with
//! [`FilterSpec::matches`] or rendered to SQL with [`FilterSpec::to_sql`].

use chrono::{DateTime, Duration, Utc};
use limitgate_core::types::{
    Transfer, TransferStatus, TransferSubtype, TransferType, UserId,
};
use rusqlite::types::Value;
use serde::Serialize;

use crate::history::TransferRecord;

/// Extra criterion narrowing the aggregated transfers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Refinement {
    /// Same transfer type as the candidate.
    #[default]
    MatchingTransferType,
    /// Same type and subtype as the candidate.
    MatchingTypeAndSubtype,
    /// Withdrawals or agent-out payments not excluded from limit calculations.
    WithdrawalOrAgentOutNotExcluded,
    /// Standard-subtype transfers.
    StandardSubtype,
}

/// How matching transfers are reduced to a single number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reducer {
    /// Total amount.
    Sum,
    /// Number of transfers.
    Count,
}

/// Criteria selecting the historical transfers an aggregation consults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    /// Sender whose history is aggregated.
    pub sender_id: Option<UserId>,
    /// Inclusive lower bound on `created_at`.
    pub since: DateTime<Utc>,
    /// Narrowing criterion.
    pub refinement: Refinement,
    /// Candidate's type, read by the matching refinements.
    pub transfer_type: TransferType,
    /// Candidate's subtype, read by [`Refinement::MatchingTypeAndSubtype`].
    pub transfer_subtype: Option<TransferSubtype>,
}

impl FilterSpec {
    /// Builds the filter for `transfer` over the last `window_days` days before `now`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{Duration, Utc};
    /// use limitgate_core::types::{Transfer, User};
    /// use limitgate_policy::filter::{FilterSpec, Refinement};
    ///
    /// let now = Utc::now();
    /// let transfer = Transfer {
    ///     sender: Some(User::new(4)),
    ///     ..Default::default()
    /// };
    ///
    /// let filter = FilterSpec::for_transfer(&transfer, 7, Refinement::default(), now);
    /// assert_eq!(filter.sender_id, Some(4));
    /// assert_eq!(filter.since, now - Duration::days(7));
    /// ```
    #[must_use]
    pub fn for_transfer(
        transfer: &Transfer,
        window_days: u32,
        refinement: Refinement,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            sender_id: transfer.sender_id(),
            since: now - Duration::days(i64::from(window_days)),
            refinement,
            transfer_type: transfer.transfer_type,
            transfer_subtype: transfer.transfer_subtype,
        }
    }

    /// Returns a copy with a different refinement.
    #[must_use]
    pub const fn with_refinement(mut self, refinement: Refinement) -> Self {
        self.refinement = refinement;
        self
    }

    /// Evaluates the filter against a stored record.
    #[must_use]
    pub fn matches(&self, record: &TransferRecord) -> bool {
        if record.sender_id != self.sender_id
            || record.status == TransferStatus::Rejected
            || record.created_at < self.since
        {
            return false;
        }

        match self.refinement {
            Refinement::MatchingTransferType => record.transfer_type == self.transfer_type,
            Refinement::MatchingTypeAndSubtype => {
                record.transfer_type == self.transfer_type
                    && record.transfer_subtype == self.transfer_subtype
            }
            Refinement::WithdrawalOrAgentOutNotExcluded => {
                (record.transfer_type == TransferType::Withdrawal
                    || record.transfer_subtype == Some(TransferSubtype::AgentOut))
                    && !record.exclude_from_limit_calcs
            }
            Refinement::StandardSubtype => {
                record.transfer_subtype == Some(TransferSubtype::Standard)
            }
        }
    }

    /// Renders the filter as a SQL `WHERE` clause over the `transfers` table.
    ///
    /// Parameters are positional (`?1`, `?2`, ...) and returned in order.
    /// `NULL` senders and subtypes compare with `IS`, so they match exactly.
    #[must_use]
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let sender = self
            .sender_id
            .and_then(|id| i64::try_from(id).ok())
            .map_or(Value::Null, Value::Integer);

        let mut clause = String::from("sender_id IS ?1 AND status != ?2 AND created_at_ms >= ?3");
        let mut params = vec![
            sender,
            Value::Text(TransferStatus::Rejected.as_str().to_string()),
            Value::Integer(self.since.timestamp_millis()),
        ];

        match self.refinement {
            Refinement::MatchingTransferType => {
                clause.push_str(" AND transfer_type = ?4");
                params.push(Value::Text(self.transfer_type.as_str().to_string()));
            }
            Refinement::MatchingTypeAndSubtype => {
                clause.push_str(" AND transfer_type = ?4 AND transfer_subtype IS ?5");
                params.push(Value::Text(self.transfer_type.as_str().to_string()));
                params.push(
                    self.transfer_subtype
                        .map_or(Value::Null, |s| Value::Text(s.as_str().to_string())),
                );
            }
            Refinement::WithdrawalOrAgentOutNotExcluded => {
                clause.push_str(
                    " AND (transfer_type = ?4 OR transfer_subtype = ?5) AND exclude_from_limit_calcs = 0",
                );
                params.push(Value::Text(TransferType::Withdrawal.as_str().to_string()));
                params.push(Value::Text(TransferSubtype::AgentOut.as_str().to_string()));
            }
            Refinement::StandardSubtype => {
                clause.push_str(" AND transfer_subtype = ?4");
                params.push(Value::Text(TransferSubtype::Standard.as_str().to_string()));
            }
        }

        (clause, params)
    }
}
