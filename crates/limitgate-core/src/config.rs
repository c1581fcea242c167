//! Configuration types for the `limitgate` transfer-limit engine.
//!
//! This module provides the configuration structures that parameterize the
//! limit registry and the history store.
//!
//! # Configuration File
//!
//! Configuration is stored in TOML format at `~/.limitgate/config.toml`.
//!
//! # Examples
//!
//! ```
//! use limitgate_core::config::Config;
//! use rust_decimal::Decimal;
//!
//! let config = Config::default();
//! assert_eq!(config.limits.exchange_rate, Decimal::ONE);
//! assert_eq!(config.limits.group_window_days, 30);
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Default TOML Output
//!
//! ```toml
//! [limits]
//! exchange_rate = "1"
//! admin_floor = "sempoadmin"
//! group_balance_fraction = "0.50"
//! group_window_days = 30
//! group_transfer_count = 1
//!
//! [limits.thresholds]
//! "0.P7" = 5000
//! # ...
//!
//! [history]
//! database_path = "history.db"
//! pool_size = 4
//! connection_timeout_secs = 5
//! ```

use crate::error::ConfigError;
use crate::types::{AdminTier, Amount};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every threshold key the reference limit policy reads.
pub const THRESHOLD_KEYS: &[&str] = &[
    "0.P7", "0.P30", "1.P7", "1.P30", "2.P7", "2.P30", "2.WD7", "2.WD30", "3.P7", "3.P30",
    "3.WD7", "3.WD30", "LT.MaxAm",
];

/// Top-level configuration.
///
/// - **Limits**: thresholds, exchange rate and group-account parameters
/// - **History**: where past transfers are stored
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Limit policy parameters.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// History store settings.
    #[serde(default)]
    pub history: HistoryConfig,
}

fn default_exchange_rate() -> Decimal {
    Decimal::ONE
}

const fn default_admin_floor() -> AdminTier {
    AdminTier::Sempoadmin
}

fn default_thresholds() -> BTreeMap<String, i64> {
    [
        ("0.P7", 5_000),
        ("0.P30", 20_000),
        ("1.P7", 5_000),
        ("1.P30", 20_000),
        ("2.P7", 50_000),
        ("2.P30", 100_000),
        ("2.WD7", 50_000),
        ("2.WD30", 100_000),
        ("3.P7", 500_000),
        ("3.P30", 1_000_000),
        ("3.WD7", 500_000),
        ("3.WD30", 1_000_000),
        ("LT.MaxAm", 50_000),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

fn default_group_balance_fraction() -> Decimal {
    Decimal::new(50, 2)
}

const fn default_group_window_days() -> u32 {
    30
}

const fn default_group_transfer_count() -> u32 {
    1
}

/// Parameters of the reference limit policy.
///
/// Thresholds are expressed in the reference currency and converted to
/// token minor units with [`LimitsConfig::scale`] when the registry is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LimitsConfig {
    /// Multiplier applied to every configured threshold.
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: Decimal,

    /// Lowest admin tier whose involvement exempts a transfer from limits.
    #[serde(default = "default_admin_floor")]
    pub admin_floor: AdminTier,

    /// Threshold amounts keyed by tier key (`"2.WD30"`, `"LT.MaxAm"`, ...).
    #[serde(default = "default_thresholds")]
    pub thresholds: BTreeMap<String, i64>,

    /// Fraction of the live balance a group account may cash out per window.
    #[serde(default = "default_group_balance_fraction")]
    pub group_balance_fraction: Decimal,

    /// Window for group-account cash-out limits, in days.
    #[serde(default = "default_group_window_days")]
    pub group_window_days: u32,

    /// Number of cash-outs a group account may make per window.
    #[serde(default = "default_group_transfer_count")]
    pub group_transfer_count: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            exchange_rate: default_exchange_rate(),
            admin_floor: default_admin_floor(),
            thresholds: default_thresholds(),
            group_balance_fraction: default_group_balance_fraction(),
            group_window_days: default_group_window_days(),
            group_transfer_count: default_group_transfer_count(),
        }
    }
}

impl LimitsConfig {
    /// Returns the raw threshold configured for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if the key is absent.
    pub fn threshold(&self, key: &str) -> Result<i64, ConfigError> {
        self.thresholds
            .get(key)
            .copied()
            .ok_or_else(|| ConfigError::missing_field(format!("limits.thresholds.{key}")))
    }

    /// Returns the threshold for `key` converted with the exchange rate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if the key is absent, or
    /// [`ConfigError::InvalidValue`] if the scaled value does not fit.
    pub fn scaled_threshold(&self, key: &str) -> Result<Amount, ConfigError> {
        let raw = self.threshold(key)?;
        self.scale(raw)
            .ok_or_else(|| ConfigError::invalid_value(format!("limits.thresholds.{key}"), raw.to_string()))
    }

    /// Multiplies `amount` by the exchange rate, truncating toward zero.
    ///
    /// Returns `None` on overflow.
    ///
    /// # Examples
    ///
    /// ```
    /// use limitgate_core::config::LimitsConfig;
    /// use rust_decimal::Decimal;
    ///
    /// let limits = LimitsConfig {
    ///     exchange_rate: Decimal::new(125, 2),
    ///     ..Default::default()
    /// };
    /// assert_eq!(limits.scale(3), Some(3));
    /// assert_eq!(limits.scale(100), Some(125));
    /// ```
    #[must_use]
    pub fn scale(&self, amount: i64) -> Option<Amount> {
        Decimal::from(amount)
            .checked_mul(self.exchange_rate)?
            .trunc()
            .to_i64()
    }

    /// Validates the limit parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] for an absent threshold key and
    /// [`ConfigError::InvalidValue`] for out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exchange_rate <= Decimal::ZERO {
            return Err(ConfigError::invalid_value(
                "limits.exchange_rate",
                self.exchange_rate.to_string(),
            ));
        }

        for key in THRESHOLD_KEYS {
            let value = self.threshold(key)?;
            if value < 0 {
                return Err(ConfigError::invalid_value(
                    format!("limits.thresholds.{key}"),
                    value.to_string(),
                ));
            }
            self.scaled_threshold(key)?;
        }

        if self.group_balance_fraction <= Decimal::ZERO || self.group_balance_fraction > Decimal::ONE {
            return Err(ConfigError::invalid_value(
                "limits.group_balance_fraction",
                self.group_balance_fraction.to_string(),
            ));
        }

        if self.group_window_days == 0 {
            return Err(ConfigError::invalid_value("limits.group_window_days", "0"));
        }

        if self.group_transfer_count == 0 {
            return Err(ConfigError::invalid_value("limits.group_transfer_count", "0"));
        }

        Ok(())
    }
}

fn default_database_path() -> String {
    "history.db".to_string()
}

const fn default_pool_size() -> u32 {
    4
}

const fn default_connection_timeout() -> u64 {
    5
}

/// Settings for the SQLite history store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Database file. `~` is expanded and relative paths are resolved
    /// against the configuration directory at load time.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// How long to wait for a pooled connection, in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            pool_size: default_pool_size(),
            connection_timeout_secs: default_connection_timeout(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if a threshold key is absent.
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - `limits.exchange_rate` is not positive
    /// - a threshold is negative or overflows once scaled
    /// - `limits.group_balance_fraction` is outside `(0, 1]`
    /// - `limits.group_window_days` or `limits.group_transfer_count` is zero
    /// - `history.database_path` is empty
    /// - `history.pool_size` or `history.connection_timeout_secs` is zero
    ///
    /// # Examples
    ///
    /// ```
    /// use limitgate_core::config::Config;
    ///
    /// let mut config = Config::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.limits.thresholds.remove("2.WD30");
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits.validate()?;

        if self.history.database_path.is_empty() {
            return Err(ConfigError::invalid_value("history.database_path", "<empty>"));
        }

        if self.history.pool_size == 0 {
            return Err(ConfigError::invalid_value("history.pool_size", "0"));
        }

        if self.history.connection_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "history.connection_timeout_secs",
                "0",
            ));
        }

        Ok(())
    }

    /// Generates the default configuration as a TOML string.
    ///
    /// # Examples
    ///
    /// ```
    /// use limitgate_core::config::Config;
    ///
    /// let toml = Config::default_toml();
    /// assert!(toml.contains("[limits]"));
    /// assert!(toml.contains("[limits.thresholds]"));
    /// assert!(toml.contains("[history]"));
    /// ```
    #[must_use]
    pub fn default_toml() -> String {
        r#"[limits]
# Multiplier converting thresholds to token minor units
exchange_rate = "1"
# Transfers involving an admin at or above this tier skip all limits
admin_floor = "sempoadmin"
group_balance_fraction = "0.50"
group_window_days = 30
group_transfer_count = 1

[limits.thresholds]
# Level 0: unverified
"0.P7" = 5000
"0.P30" = 20000
# Level 1: phone verified
"1.P7" = 5000
"1.P30" = 20000
# Level 2: individual KYC
"2.P7" = 50000
"2.P30" = 100000
"2.WD7" = 50000
"2.WD30" = 100000
# Level 3: business or multi-document KYC
"3.P7" = 500000
"3.P30" = 1000000
"3.WD7" = 500000
"3.WD30" = 1000000
# Liquid token group accounts, per transfer
"LT.MaxAm" = 50000

[history]
# Relative paths are resolved against this file's directory
database_path = "history.db"
pool_size = 4
connection_timeout_secs = 5
"#
        .to_string()
    }

    /// Creates a configuration builder for customizing values.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for creating customized [`Config`] instances.
///
/// # Examples
///
/// ```
/// use limitgate_core::config::ConfigBuilder;
/// use rust_decimal::Decimal;
///
/// let config = ConfigBuilder::new()
///     .exchange_rate(Decimal::new(2, 0))
///     .threshold("LT.MaxAm", 100)
///     .database_path("/var/lib/limitgate/history.db")
///     .build();
///
/// assert_eq!(config.limits.scaled_threshold("LT.MaxAm").unwrap(), 200);
/// assert_eq!(config.history.database_path, "/var/lib/limitgate/history.db");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new configuration builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Sets the exchange rate.
    #[must_use]
    pub const fn exchange_rate(mut self, rate: Decimal) -> Self {
        self.config.limits.exchange_rate = rate;
        self
    }

    /// Sets the admin exemption floor.
    #[must_use]
    pub const fn admin_floor(mut self, floor: AdminTier) -> Self {
        self.config.limits.admin_floor = floor;
        self
    }

    /// Sets a single threshold.
    #[must_use]
    pub fn threshold(mut self, key: impl Into<String>, amount: i64) -> Self {
        self.config.limits.thresholds.insert(key.into(), amount);
        self
    }

    /// Sets the group-account balance fraction.
    #[must_use]
    pub const fn group_balance_fraction(mut self, fraction: Decimal) -> Self {
        self.config.limits.group_balance_fraction = fraction;
        self
    }

    /// Sets the group-account window.
    #[must_use]
    pub const fn group_window_days(mut self, days: u32) -> Self {
        self.config.limits.group_window_days = days;
        self
    }

    /// Sets the group-account transfer count.
    #[must_use]
    pub const fn group_transfer_count(mut self, count: u32) -> Self {
        self.config.limits.group_transfer_count = count;
        self
    }

    /// Sets the history database path.
    #[must_use]
    pub fn database_path(mut self, path: impl Into<String>) -> Self {
        self.config.history.database_path = path.into();
        self
    }

    /// Sets the history pool size.
    #[must_use]
    pub const fn pool_size(mut self, size: u32) -> Self {
        self.config.history.pool_size = size;
        self
    }

    /// Builds the final configuration.
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }
}
