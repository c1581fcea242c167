//! Integration tests for the record-evaluate-complete flow.
//!
//! These tests drive the command handlers against a real configuration file
//! and `SQLite` database:
//! - Fixture transfers and their expected verdicts
//! - Window accumulation across pending and completed transfers
//! - The group account cash-out limits
//! - Configuration changes (exchange rate) taking effect

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::needless_raw_string_hashes
)]

use limitgate::cli::args::{HistoryCommands, OutputFormat};
use limitgate::cli::commands::{
    CheckCommand, CheckOutput, HistoryCommand, LimitsCommand, LimitsListing,
};
use limitgate_core::config::Config;
use limitgate_core::types::TransferStatus;
use limitgate_policy::registry::GROUP_ACCOUNT_LIMIT;
use proptest::prelude::*;

use crate::common::{fixture_transfer, load_fixture, payment_json, transfer_amount, TestEnv};

const GROUP_SENDER: &str = r#"{"id": 9, "phone_verified": true, "has_group_account_role": true}"#;

fn check(env: &TestEnv, transfer: &str) -> CheckOutput {
    CheckCommand::new(env.context(), transfer, OutputFormat::Json, false)
        .execute()
        .expect("check should evaluate")
}

fn check_all(env: &TestEnv, transfer: &str) -> CheckOutput {
    CheckCommand::new(env.context(), transfer, OutputFormat::Json, true)
        .execute()
        .expect("check should evaluate")
}

fn applicable(env: &TestEnv, transfer: &str) -> LimitsListing {
    LimitsCommand::new(env.context(), Some(transfer.to_string()), OutputFormat::Json)
        .execute()
        .expect("limits should list")
}

fn history(env: &TestEnv, command: HistoryCommands) {
    HistoryCommand::new(env.context(), command)
        .execute()
        .expect("history command should succeed");
}

fn status_of(env: &TestEnv, sender: u64, id: u64) -> TransferStatus {
    env.history()
        .get_transfers(sender, 100)
        .unwrap()
        .into_iter()
        .find(|r| r.id == id)
        .map(|r| r.status)
        .expect("transfer should be stored")
}

// ============================================================================
// Fixtures
// ============================================================================

#[test]
fn test_fixture_verdicts() {
    for name in [
        "tier0_payment",
        "tier0_withdrawal",
        "kyc_liquid_cash_out",
        "admin_withdrawal",
    ] {
        let env = TestEnv::new();
        let path = format!("transfers/{name}.json");
        let fixture = load_fixture(&path).unwrap();
        let expected = &fixture["expected"];
        let transfer = fixture_transfer(&path);

        let names: Vec<String> = applicable(&env, &transfer)
            .limits
            .iter()
            .map(|rule| rule.name().to_string())
            .collect();
        let expected_names: Vec<String> =
            serde_json::from_value(expected["applicable"].clone()).unwrap();
        assert_eq!(names, expected_names, "{name}: applicable limits");

        let output = check(&env, &transfer);
        assert_eq!(
            output.allowed,
            expected["allowed"].as_bool().unwrap(),
            "{name}: verdict"
        );
        assert_eq!(output.applicable, expected_names.len(), "{name}: count");

        if let Some(limit) = expected.get("limit") {
            let violation = &output.violations[0];
            assert_eq!(violation.limit, limit.as_str().unwrap(), "{name}: limit");
            assert_eq!(
                violation.reason.kind(),
                expected["kind"].as_str().unwrap(),
                "{name}: kind"
            );
        }
    }
}

// ============================================================================
// Window Accumulation
// ============================================================================

#[test]
fn test_completed_and_pending_transfers_both_count() {
    let env = TestEnv::new();
    let sender = r#"{"id": 5}"#;

    assert!(check(&env, &payment_json(1, sender, 2000, "STANDARD", "RESERVE")).allowed);
    history(
        &env,
        HistoryCommands::SetStatus {
            transfer_id: 1,
            status: "COMPLETE".to_string(),
        },
    );
    assert!(check(&env, &payment_json(2, sender, 2000, "STANDARD", "RESERVE")).allowed);

    let output = check(&env, &payment_json(3, sender, 1001, "STANDARD", "RESERVE"));
    assert!(!output.allowed);
    assert_eq!(output.violations[0].reason.available(), Some(1000));

    assert!(check(&env, &payment_json(4, sender, 1000, "STANDARD", "RESERVE")).allowed);

    assert_eq!(status_of(&env, 5, 1), TransferStatus::Complete);
    assert_eq!(status_of(&env, 5, 3), TransferStatus::Rejected);
    assert_eq!(status_of(&env, 5, 4), TransferStatus::Pending);
}

#[test]
fn test_senders_do_not_share_windows() {
    let env = TestEnv::new();

    assert!(check(&env, &payment_json(1, r#"{"id": 5}"#, 5000, "STANDARD", "RESERVE")).allowed);
    assert!(check(&env, &payment_json(2, r#"{"id": 6}"#, 5000, "STANDARD", "RESERVE")).allowed);
    assert!(!check(&env, &payment_json(3, r#"{"id": 5}"#, 1, "STANDARD", "RESERVE")).allowed);
}

#[test]
fn test_rechecking_same_id_does_not_double_count() {
    let env = TestEnv::new();
    let transfer = payment_json(1, r#"{"id": 5}"#, 5000, "STANDARD", "RESERVE");

    assert!(check(&env, &transfer).allowed);
    assert!(check(&env, &transfer).allowed);
    assert_eq!(env.history().transfer_count().unwrap(), 1);
}

// ============================================================================
// Group Account Cash-Out
// ============================================================================

#[test]
fn test_group_account_cash_out_flow() {
    let env = TestEnv::new();

    history(
        &env,
        HistoryCommands::Balance {
            user_id: 9,
            amount: Some(1000),
        },
    );
    history(
        &env,
        HistoryCommands::Record {
            transfer: payment_json(1, GROUP_SENDER, 400, "STANDARD", "LIQUID")
                .replace(r#""amount": 400,"#, r#""amount": 400, "status": "COMPLETE","#),
        },
    );
    assert_eq!(status_of(&env, 9, 1), TransferStatus::Complete);

    let first = check(&env, &payment_json(2, GROUP_SENDER, 300, "AGENT_OUT", "LIQUID"));
    assert!(first.allowed, "{:?}", first.violations);
    assert_eq!(first.applicable, 6);

    let second = check(&env, &payment_json(3, GROUP_SENDER, 100, "AGENT_OUT", "LIQUID"));
    assert!(!second.allowed);
    assert_eq!(second.violations[0].limit, GROUP_ACCOUNT_LIMIT);
    assert_eq!(second.violations[0].reason.kind(), "transfer_count_exceeded");

    let all = check_all(&env, &payment_json(4, GROUP_SENDER, 600, "AGENT_OUT", "LIQUID"));
    let kinds: Vec<&str> = all.violations.iter().map(|v| v.reason.kind()).collect();
    assert_eq!(
        kinds,
        [
            "transfer_count_exceeded",
            "balance_fraction_exceeded",
            "minimum_sent_not_met",
        ]
    );
    assert_eq!(all.violations[1].reason.available(), Some(200));
    assert_eq!(all.violations[2].reason.available(), Some(100));
}

#[test]
fn test_group_cash_out_above_maximum() {
    let env = TestEnv::new();
    history(
        &env,
        HistoryCommands::Balance {
            user_id: 9,
            amount: Some(1_000_000),
        },
    );
    history(
        &env,
        HistoryCommands::Record {
            transfer: payment_json(1, GROUP_SENDER, 100_000, "STANDARD", "LIQUID"),
        },
    );

    let output = check_all(&env, &payment_json(2, GROUP_SENDER, 50_001, "AGENT_OUT", "LIQUID"));
    let kinds: Vec<&str> = output.violations.iter().map(|v| v.reason.kind()).collect();
    assert!(kinds.contains(&"max_per_transfer_exceeded"), "{kinds:?}");
    assert!(output.violations.iter().all(|v| v.limit != "GE Liquid Token - Standard User"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_exchange_rate_scales_thresholds() {
    let env = TestEnv::new();
    env.write_config(&Config::default_toml().replace(
        r#"exchange_rate = "1""#,
        r#"exchange_rate = "2""#,
    ));

    let sender = r#"{"id": 5}"#;
    assert!(check(&env, &payment_json(1, sender, 10_000, "STANDARD", "RESERVE")).allowed);
    assert!(!check(&env, &payment_json(2, sender, 1, "STANDARD", "RESERVE")).allowed);

    let rules = LimitsCommand::new(env.context(), None, OutputFormat::Text)
        .execute()
        .unwrap()
        .limits;
    let json = serde_json::to_value(&rules).unwrap();
    assert_eq!(json[0]["total"], 10_000);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_first_transfer_verdict_matches_ceiling(amount in transfer_amount()) {
        let env = TestEnv::new();
        let output = check(&env, &payment_json(1, r#"{"id": 5}"#, amount, "STANDARD", "RESERVE"));
        prop_assert_eq!(output.allowed, amount <= 5000);
    }
}
