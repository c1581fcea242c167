//! Integration tests for history maintenance through the `history` command.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::needless_raw_string_hashes
)]

use chrono::{Duration, Utc};
use limitgate::cli::args::{HistoryCommands, OutputFormat};
use limitgate::cli::commands::{CheckCommand, HistoryCommand, HistoryCommandError, HistoryOutput};
use limitgate_core::types::{Transfer, TransferStatus, TransferSubtype, TransferType, User};
use limitgate_policy::history::TransferHistory;

use crate::common::{payment_json, TestEnv};

fn run(env: &TestEnv, command: HistoryCommands) -> Result<HistoryOutput, HistoryCommandError> {
    HistoryCommand::new(env.context(), command).execute()
}

fn aged_payment(id: u64, amount: i64, age_days: i64) -> Transfer {
    Transfer {
        id,
        amount,
        transfer_type: TransferType::Payment,
        transfer_subtype: Some(TransferSubtype::Standard),
        sender: Some(User::new(5)),
        created_at: Utc::now() - Duration::days(age_days),
        status: TransferStatus::Complete,
        ..Default::default()
    }
}

#[test]
fn test_cleanup_frees_nothing_inside_windows() {
    let env = TestEnv::new();
    let history = env.history();
    history.record(&aged_payment(1, 4000, 100)).unwrap();
    history.record(&aged_payment(2, 4000, 3)).unwrap();
    drop(history);

    let output = run(&env, HistoryCommands::Cleanup { older_than_days: 90 }).unwrap();
    assert_eq!(output, HistoryOutput::Cleaned(1));

    let check = |id: u64, amount: i64| {
        CheckCommand::new(
            env.context(),
            payment_json(id, r#"{"id": 5}"#, amount, "STANDARD", "RESERVE"),
            OutputFormat::Text,
            false,
        )
        .execute()
        .unwrap()
    };
    assert!(!check(3, 1001).allowed);
    assert!(check(4, 1000).allowed);
}

#[test]
fn test_transfers_outside_window_do_not_count() {
    let env = TestEnv::new();
    env.history().record(&aged_payment(1, 5000, 8)).unwrap();

    let output = CheckCommand::new(
        env.context(),
        payment_json(2, r#"{"id": 5}"#, 5000, "STANDARD", "RESERVE"),
        OutputFormat::Text,
        true,
    )
    .execute()
    .unwrap();

    assert!(output.allowed, "{:?}", output.violations);
}

#[test]
fn test_balance_round_trip_through_database() {
    let env = TestEnv::new();
    run(
        &env,
        HistoryCommands::Balance {
            user_id: 9,
            amount: Some(750),
        },
    )
    .unwrap();

    assert_eq!(env.history().current_balance(9).unwrap(), 750);
    assert_eq!(env.history().current_balance(10).unwrap(), 0);
}

#[test]
fn test_list_is_newest_first_and_limited() {
    let env = TestEnv::new();
    let history = env.history();
    for (id, age) in [(1, 5), (2, 1), (3, 3)] {
        history.record(&aged_payment(id, 10, age)).unwrap();
    }
    drop(history);

    let output = run(
        &env,
        HistoryCommands::List {
            sender_id: 5,
            limit: 2,
            format: OutputFormat::Json,
        },
    )
    .unwrap();

    match output {
        HistoryOutput::Transfers(records) => {
            let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
            assert_eq!(ids, [2, 3]);
        }
        other => panic!("unexpected output {other:?}"),
    }
}

#[test]
fn test_invalid_record_input() {
    let env = TestEnv::new();
    let err = run(
        &env,
        HistoryCommands::Record {
            transfer: r#"{"id": 1}"#.to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, HistoryCommandError::Input(_)));
}
