//! # Test Utilities for `limitgate`
//!
//! Shared helpers for integration tests.
//!
//! ## Functions
//!
//! - [`load_fixture`] - Load a JSON fixture file from the fixtures directory
//! - [`fixture_transfer`] - Load just the `transfer` object of a fixture as JSON text
//! - [`temp_data_dir`] - Create an isolated temporary directory for test data
//! - [`TestEnv`] - An initialized configuration and history database
//!
//! ## Proptest Strategies
//!
//! - [`transfer_amount`] - Positive amounts in minor units

#![allow(dead_code)]
#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};

use limitgate::cli::commands::{CommandContext, InitCommand};
use limitgate_core::config_loader::ConfigLoader;
use limitgate_policy::history::SqliteHistory;
use proptest::prelude::*;
use tempfile::TempDir;

/// Error type for fixture loading operations.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// The fixture file could not be found.
    #[error("Fixture not found: {0}")]
    NotFound(String),

    /// The fixture file could not be read.
    #[error("Failed to read fixture: {0}")]
    ReadError(#[from] std::io::Error),

    /// The fixture JSON could not be parsed.
    #[error("Failed to parse fixture JSON: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Load a JSON fixture file from the `tests/fixtures/` directory at the
/// workspace root, e.g. `"transfers/tier0_payment.json"`.
pub fn load_fixture(path: &str) -> Result<serde_json::Value, FixtureError> {
    let fixture_path = fixtures_dir().join(path);

    if !fixture_path.exists() {
        return Err(FixtureError::NotFound(fixture_path.display().to_string()));
    }

    let content = std::fs::read_to_string(&fixture_path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Returns the `transfer` object of a fixture, serialized for the CLI.
///
/// # Panics
///
/// Panics if the fixture is missing or has no `transfer` field.
#[must_use]
pub fn fixture_transfer(path: &str) -> String {
    let fixture = load_fixture(path).expect("fixture should load");
    fixture
        .get("transfer")
        .expect("fixture should have a 'transfer' field")
        .to_string()
}

/// crates/limitgate -> crates -> workspace root.
fn fixtures_dir() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(manifest_dir)
        .parent()
        .and_then(Path::parent)
        .map_or_else(
            || PathBuf::from("tests/fixtures"),
            |p| p.join("tests").join("fixtures"),
        )
}

/// Create a temporary directory, removed when the returned `TempDir` drops.
///
/// # Panics
///
/// Panics if the directory cannot be created.
#[must_use]
pub fn temp_data_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("limitgate-test-")
        .tempdir()
        .expect("Failed to create temporary directory for test")
}

/// An initialized `limitgate` home in a temporary directory.
pub struct TestEnv {
    temp: TempDir,
}

impl TestEnv {
    /// Runs `init` in a fresh temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if initialization fails.
    #[must_use]
    pub fn new() -> Self {
        let env = Self {
            temp: temp_data_dir(),
        };
        InitCommand::new(env.context(), false)
            .execute()
            .expect("init should succeed");
        env
    }

    /// Directory holding `config.toml` and `history.db`.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        self.temp.path()
    }

    /// Path of the configuration file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.temp.path().join("config.toml")
    }

    /// A command context bound to this environment.
    #[must_use]
    pub fn context(&self) -> CommandContext {
        CommandContext::with_loader(ConfigLoader::with_base_dir(self.temp.path().to_path_buf()))
    }

    /// Opens the environment's history database directly.
    ///
    /// # Panics
    ///
    /// Panics if the configuration or database cannot be opened.
    #[must_use]
    pub fn history(&self) -> SqliteHistory {
        let config = self.context().load_config().expect("config should load");
        CommandContext::open_history(&config).expect("history should open")
    }

    /// Rewrites the configuration file.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_config(&self, content: &str) {
        std::fs::write(self.config_path(), content).expect("config should be writable");
    }
}

/// JSON text for a payment from `sender` with the given subtype and token type.
#[must_use]
pub fn payment_json(
    id: u64,
    sender: &str,
    amount: i64,
    subtype: &str,
    token_type: &str,
) -> String {
    format!(
        r#"{{"id": {id}, "amount": {amount}, "transfer_type": "PAYMENT",
            "transfer_subtype": "{subtype}",
            "token": {{"symbol": "GE", "token_type": "{token_type}"}},
            "sender": {sender}}}"#
    )
}

// =============================================================================
// Proptest Strategies
// =============================================================================

/// Positive transfer amounts up to ten million minor units.
pub fn transfer_amount() -> impl Strategy<Value = i64> {
    1_i64..=10_000_000
}
