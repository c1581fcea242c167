//! # limitgate-policy
//!
//! Transfer-limit evaluation for `limitgate`.
//!
//! ## Modules
//!
//! - [`predicates`] - Eligibility predicates over transfer snapshots
//! - [`filter`] - Historical query construction ([`FilterSpec`])
//! - [`history`] - The [`TransferHistory`] collaborator and its backends
//! - [`limit`] - Limit rules and their capacity arithmetic
//! - [`registry`] - The ordered rule set, including the reference policy
//! - [`engine`] - The [`LimitEvaluator`]
//!
//! ## Reference Policy
//!
//! [`LimitRegistry::from_config`] builds the tiered policy:
//!
//! - Tiers 0 and 1 (unverified, phone verified) get 7 and 30 day payment
//!   ceilings and may not withdraw or deposit.
//! - Tiers 2 and 3 (individual KYC, business KYC) get 7 and 30 day ceilings
//!   on payments and on withdrawals/deposits.
//! - Liquid tokens: standard users may not cash out; group accounts are
//!   limited by count, balance fraction, prior standard activity and a
//!   per-transfer maximum.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod engine;
pub mod filter;
pub mod history;
pub mod limit;
pub mod predicates;
pub mod registry;

pub use engine::{LimitCheckResult, LimitEngine, LimitEvaluator};
pub use filter::{FilterSpec, Reducer, Refinement};
pub use history::{InMemoryHistory, SqliteHistory, SqliteOptions, TransferHistory, TransferRecord};
pub use limit::{LimitKind, LimitRule, Selector};
pub use predicates::{verification_tier, Eligibility, VerificationTier};
pub use registry::{LimitRegistry, GROUP_ACCOUNT_LIMIT, STANDARD_USER_LIMIT};
