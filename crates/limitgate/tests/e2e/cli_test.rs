//! Tests of the compiled `limitgate` binary: output on stdout, diagnostics on
//! stderr, and the exit code contract (0 allowed, 1 rejected, 2 error).

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::path::Path;
use std::process::{Command, Output};

use crate::common::{fixture_transfer, temp_data_dir};

fn limitgate(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_limitgate"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("binary should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout should be UTF-8")
}

#[test]
fn test_init_check_and_complete() {
    let temp = temp_data_dir();
    let config = temp.path().join("config.toml");

    let init = limitgate(&config, &["init"]);
    assert_eq!(init.status.code(), Some(0));
    assert!(stdout(&init).contains("initialized successfully"));
    assert!(temp.path().join("history.db").exists());

    let transfer = fixture_transfer("transfers/tier0_payment.json");
    let check = limitgate(&config, &["check", &transfer, "--format", "json"]);
    assert_eq!(check.status.code(), Some(0));

    let json: serde_json::Value = serde_json::from_str(&stdout(&check)).unwrap();
    assert_eq!(json["transfer_id"], 101);
    assert_eq!(json["allowed"], true);

    let complete = limitgate(&config, &["history", "set-status", "101", "COMPLETE"]);
    assert_eq!(complete.status.code(), Some(0));
    assert!(stdout(&complete).contains("Transfer 101 is now COMPLETE"));
}

#[test]
fn test_rejection_exits_one() {
    let temp = temp_data_dir();
    let config = temp.path().join("config.toml");
    assert_eq!(limitgate(&config, &["init"]).status.code(), Some(0));

    let transfer = fixture_transfer("transfers/tier0_withdrawal.json");
    let output = limitgate(&config, &["check", &transfer]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).starts_with("REJECTED: transfer 102"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Sempo Level 0: WD30"), "{stderr}");
}

#[test]
fn test_invalid_input_exits_two() {
    let temp = temp_data_dir();
    let config = temp.path().join("config.toml");

    let output = limitgate(&config, &["check", "{broken"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_config_must_be_named_config_toml() {
    let temp = temp_data_dir();
    let output = limitgate(&temp.path().join("limits.toml"), &["status"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_config_validate_and_limits_json() {
    let temp = temp_data_dir();
    let config = temp.path().join("config.toml");
    assert_eq!(limitgate(&config, &["init"]).status.code(), Some(0));

    let validate = limitgate(&config, &["config", "validate"]);
    assert_eq!(validate.status.code(), Some(0));
    assert!(stdout(&validate).contains("19 limits"));

    let limits = limitgate(&config, &["limits", "--format", "json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout(&limits)).unwrap();
    assert_eq!(json["limits"].as_array().map(Vec::len), Some(19));
}

#[test]
fn test_negative_amount_exits_two_and_is_not_recorded() {
    let temp = temp_data_dir();
    let config = temp.path().join("config.toml");
    assert_eq!(limitgate(&config, &["init"]).status.code(), Some(0));

    let transfer = r#"{
        "id": 7,
        "amount": -5000,
        "transfer_type": "PAYMENT",
        "transfer_subtype": "STANDARD",
        "token": {"symbol": "GE", "token_type": "RESERVE"},
        "sender": {"id": 3}
    }"#;
    let output = limitgate(&config, &["check", transfer]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("must not be negative"), "{stderr}");

    let listing = limitgate(&config, &["history", "list", "3"]);
    assert_eq!(listing.status.code(), Some(0));
    assert!(!stdout(&listing).contains("-5000"));
}
