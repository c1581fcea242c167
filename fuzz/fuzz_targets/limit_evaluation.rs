//! Fuzz target for limit evaluation.
//!
//! Replays an arbitrary sequence of transfers through the reference registry
//! backed by in-memory history, checking that evaluation never panics and
//! that the first-violation and all-violations paths agree.
//!
//! # Running
//!
//! ```bash
//! cargo +nightly fuzz run limit_evaluation
//! ```

#![no_main]

use std::sync::Arc;

use arbitrary::{Arbitrary, Unstructured};
use chrono::{Duration, Utc};
use libfuzzer_sys::fuzz_target;
use limitgate_core::config::LimitsConfig;
use limitgate_core::types::{
    AdminTier, KycApplication, KycStatus, KycType, Token, TokenType, Transfer, TransferStatus,
    TransferSubtype, TransferType, User,
};
use limitgate_policy::engine::{LimitCheckResult, LimitEngine, LimitEvaluator};
use limitgate_policy::history::InMemoryHistory;
use limitgate_policy::registry::LimitRegistry;
use rust_decimal::Decimal;

#[derive(Debug, Arbitrary)]
struct FuzzUser {
    id: u8,
    phone_verified: bool,
    kyc: Option<(bool, bool, bool)>,
    admin: Option<u8>,
    group: bool,
    balance: i32,
}

#[derive(Debug, Arbitrary)]
struct FuzzTransfer {
    amount: i32,
    type_selector: u8,
    subtype_selector: u8,
    liquid: Option<bool>,
    sender: Option<FuzzUser>,
    age_hours: u16,
    exclude: bool,
    complete: bool,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    exchange_rate_cents: u16,
    group_transfer_count: u8,
    transfers: Vec<FuzzTransfer>,
}

fn user(input: &FuzzUser) -> User {
    let mut user = User::new(u64::from(input.id))
        .with_phone_verified(input.phone_verified)
        .with_group_account_role(input.group)
        .with_balance(i64::from(input.balance));
    if let Some((verified, business, multidoc)) = input.kyc {
        user = user.with_kyc(KycApplication {
            status: if verified {
                KycStatus::Verified
            } else {
                KycStatus::Pending
            },
            kyc_type: if business {
                KycType::Business
            } else {
                KycType::Individual
            },
            multiple_documents_verified: multidoc,
        });
    }
    if let Some(tier) = input.admin {
        user = user.with_admin_tier(match tier % 5 {
            0 => AdminTier::View,
            1 => AdminTier::Subadmin,
            2 => AdminTier::Admin,
            3 => AdminTier::Superadmin,
            _ => AdminTier::Sempoadmin,
        });
    }
    user
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);
    let Ok(input) = FuzzInput::arbitrary(&mut unstructured) else {
        return;
    };

    let config = LimitsConfig {
        exchange_rate: Decimal::new(i64::from(input.exchange_rate_cents), 2),
        group_transfer_count: u32::from(input.group_transfer_count),
        ..LimitsConfig::default()
    };
    // Zero rates and counts are rejected at construction.
    let Ok(registry) = LimitRegistry::from_config(&config) else {
        return;
    };

    let history = InMemoryHistory::new();
    let evaluator = LimitEvaluator::new(Arc::new(registry), &history);
    let now = Utc::now();

    for (id, fuzz) in input.transfers.iter().take(64).enumerate() {
        let transfer = Transfer {
            id: id as u64 + 1,
            amount: i64::from(fuzz.amount),
            transfer_type: TransferType::ALL[usize::from(fuzz.type_selector) % 3],
            transfer_subtype: TransferSubtype::ALL
                .get(usize::from(fuzz.subtype_selector) % 5)
                .copied(),
            token: fuzz.liquid.map(|liquid| {
                Token::new(
                    "GE",
                    if liquid {
                        TokenType::Liquid
                    } else {
                        TokenType::Reserve
                    },
                )
            }),
            sender: fuzz.sender.as_ref().map(user),
            recipient: None,
            created_at: now - Duration::hours(i64::from(fuzz.age_hours)),
            status: TransferStatus::Pending,
            exclude_from_limit_calcs: fuzz.exclude,
        };

        if let Some(sender) = &transfer.sender {
            let _ = history.set_balance(sender.id, sender.balance);
        }
        if history.record(&transfer).is_err() {
            return;
        }

        let Ok(first) = evaluator.check(&transfer) else {
            return;
        };
        let Ok(all) = evaluator.check_all(&transfer) else {
            return;
        };

        match &first {
            LimitCheckResult::Allowed => assert!(all.is_empty()),
            LimitCheckResult::Rejected(reason) => assert_eq!(all.first(), Some(reason)),
        }

        let status = if first.is_rejected() {
            TransferStatus::Rejected
        } else if fuzz.complete {
            TransferStatus::Complete
        } else {
            TransferStatus::Pending
        };
        let _ = history.set_status(transfer.id, status);
    }
});
