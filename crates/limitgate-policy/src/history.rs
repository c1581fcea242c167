//! Historical transfer storage.
//!
//! The evaluator reads history only through [`TransferHistory`]. Two
//! backends are provided:
//!
//! - [`InMemoryHistory`] - `RwLock`-guarded records, for tests and embedding
//! - [`SqliteHistory`] - `SQLite` persistence with `r2d2` connection pooling
//!
//! Aggregates are always computed live; nothing is cached, so a balance
//! change or a new transfer is visible to the very next validation.
//!
//! # Example
//!
//! ```
//! use limitgate_core::types::{Transfer, User};
//! use limitgate_policy::filter::{FilterSpec, Reducer, Refinement};
//! use limitgate_policy::history::{SqliteHistory, TransferHistory};
//! use chrono::Utc;
//!
//! let history = SqliteHistory::in_memory().unwrap();
//! let transfer = Transfer {
//!     id: 1,
//!     amount: 250,
//!     sender: Some(User::new(3)),
//!     ..Default::default()
//! };
//! history.record(&transfer).unwrap();
//!
//! let filter = FilterSpec::for_transfer(&transfer, 7, Refinement::default(), Utc::now());
//! assert_eq!(history.aggregate(&filter, Reducer::Sum).unwrap(), 250);
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use limitgate_core::error::HistoryError;
use limitgate_core::types::{
    Amount, Transfer, TransferId, TransferStatus, TransferSubtype, TransferType, UserId,
};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, params_from_iter, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::filter::{FilterSpec, Reducer};

/// Read-only query capability the evaluator aggregates over.
///
/// Implementations must be `Send + Sync`; validations for different senders
/// may run concurrently.
pub trait TransferHistory: Send + Sync {
    /// Reduces the transfers selected by `filter`. Empty sets reduce to 0
    /// and sums saturate at the `i64` bounds.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the backing store fails.
    fn aggregate(&self, filter: &FilterSpec, reducer: Reducer) -> Result<i64, HistoryError>;

    /// Returns the live balance of `user_id`, or 0 if none is known.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the backing store fails.
    fn current_balance(&self, user_id: UserId) -> Result<Amount, HistoryError>;
}

impl<T: TransferHistory + ?Sized> TransferHistory for Arc<T> {
    fn aggregate(&self, filter: &FilterSpec, reducer: Reducer) -> Result<i64, HistoryError> {
        (**self).aggregate(filter, reducer)
    }

    fn current_balance(&self, user_id: UserId) -> Result<Amount, HistoryError> {
        (**self).current_balance(user_id)
    }
}

impl<T: TransferHistory + ?Sized> TransferHistory for &T {
    fn aggregate(&self, filter: &FilterSpec, reducer: Reducer) -> Result<i64, HistoryError> {
        (**self).aggregate(filter, reducer)
    }

    fn current_balance(&self, user_id: UserId) -> Result<Amount, HistoryError> {
        (**self).current_balance(user_id)
    }
}

/// The fields of a transfer that aggregation reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRecord {
    /// Transfer identifier.
    pub id: TransferId,
    /// Sending user.
    pub sender_id: Option<UserId>,
    /// Amount in minor units.
    pub amount: Amount,
    /// Transfer direction.
    pub transfer_type: TransferType,
    /// Direction refinement.
    pub transfer_subtype: Option<TransferSubtype>,
    /// Token symbol, empty when unknown.
    pub token: String,
    /// Lifecycle status.
    pub status: TransferStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Whether withdrawal aggregation ignores this transfer.
    pub exclude_from_limit_calcs: bool,
}

impl From<&Transfer> for TransferRecord {
    fn from(transfer: &Transfer) -> Self {
        Self {
            id: transfer.id,
            sender_id: transfer.sender_id(),
            amount: transfer.amount,
            transfer_type: transfer.transfer_type,
            transfer_subtype: transfer.transfer_subtype,
            token: transfer.token_symbol().to_string(),
            status: transfer.status,
            created_at: transfer.created_at,
            exclude_from_limit_calcs: transfer.exclude_from_limit_calcs,
        }
    }
}

fn reduce<'a>(records: impl Iterator<Item = &'a TransferRecord>, reducer: Reducer) -> i64 {
    match reducer {
        Reducer::Sum => records.fold(0_i64, |acc, r| acc.saturating_add(r.amount)),
        Reducer::Count => i64::try_from(records.count()).unwrap_or(i64::MAX),
    }
}

// ============================================================================
// InMemoryHistory
// ============================================================================

/// History held in process memory.
///
/// Recording a transfer with an existing id replaces the earlier record.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    records: RwLock<Vec<TransferRecord>>,
    balances: RwLock<HashMap<UserId, Amount>>,
}

fn poisoned<T>(_: T) -> HistoryError {
    HistoryError::storage("history lock poisoned")
}

impl InMemoryHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a transfer, replacing any record with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Storage`] if the lock is poisoned.
    pub fn record(&self, transfer: &Transfer) -> Result<(), HistoryError> {
        self.insert(TransferRecord::from(transfer))
    }

    /// Stores a record, replacing any record with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Storage`] if the lock is poisoned.
    pub fn insert(&self, record: TransferRecord) -> Result<(), HistoryError> {
        let mut records = self.records.write().map_err(poisoned)?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    /// Updates the status of a stored transfer.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::TransferNotFound`] for an unknown id.
    pub fn set_status(&self, id: TransferId, status: TransferStatus) -> Result<(), HistoryError> {
        let mut records = self.records.write().map_err(poisoned)?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(HistoryError::TransferNotFound { id })?;
        record.status = status;
        Ok(())
    }

    /// Sets the live balance of a user.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Storage`] if the lock is poisoned.
    pub fn set_balance(&self, user_id: UserId, balance: Amount) -> Result<(), HistoryError> {
        self.balances
            .write()
            .map_err(poisoned)?
            .insert(user_id, balance);
        Ok(())
    }

    /// Returns a snapshot of every stored record.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Storage`] if the lock is poisoned.
    pub fn records(&self) -> Result<Vec<TransferRecord>, HistoryError> {
        Ok(self.records.read().map_err(poisoned)?.clone())
    }
}

impl TransferHistory for InMemoryHistory {
    fn aggregate(&self, filter: &FilterSpec, reducer: Reducer) -> Result<i64, HistoryError> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(reduce(records.iter().filter(|r| filter.matches(r)), reducer))
    }

    fn current_balance(&self, user_id: UserId) -> Result<Amount, HistoryError> {
        let balances = self.balances.read().map_err(poisoned)?;
        Ok(balances.get(&user_id).copied().unwrap_or(0))
    }
}

// ============================================================================
// SqliteHistory
// ============================================================================

/// Default maximum number of pooled connections for file databases.
const DEFAULT_POOL_SIZE: u32 = 4;

/// Options for opening a [`SqliteHistory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqliteOptions {
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// How long to wait for a free connection.
    pub connection_timeout: std::time::Duration,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            connection_timeout: std::time::Duration::from_secs(5),
        }
    }
}

/// History persisted in `SQLite`.
///
/// # Thread Safety
///
/// This struct is `Send + Sync`. The `r2d2` pool hands each caller its own
/// connection, so aggregations for different senders run in parallel.
pub struct SqliteHistory {
    pool: Pool<SqliteConnectionManager>,
}

impl std::fmt::Debug for SqliteHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteHistory")
            .field("max_size", &self.pool.max_size())
            .finish_non_exhaustive()
    }
}

fn storage(e: impl std::fmt::Display) -> HistoryError {
    HistoryError::storage(e.to_string())
}

fn to_sql_id(id: u64, what: &str) -> Result<i64, HistoryError> {
    i64::try_from(id).map_err(|_| HistoryError::invalid_record(format!("{what} {id} out of range")))
}

impl SqliteHistory {
    /// Opens (or creates) a file database with default pool options.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Storage`] if the database cannot be opened or initialized.
    pub fn new(db_path: &Path) -> Result<Self, HistoryError> {
        Self::with_options(db_path, SqliteOptions::default())
    }

    /// Opens (or creates) a file database.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Storage`] if the database cannot be opened or initialized.
    pub fn with_options(db_path: &Path, options: SqliteOptions) -> Result<Self, HistoryError> {
        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")
        });
        Self::from_manager(manager, options)
    }

    /// Creates an in-memory database.
    ///
    /// Every connection to `:memory:` is a separate database, so the pool
    /// holds exactly one connection.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Storage`] if the database cannot be initialized.
    pub fn in_memory() -> Result<Self, HistoryError> {
        let options = SqliteOptions {
            pool_size: 1,
            ..SqliteOptions::default()
        };
        Self::from_manager(SqliteConnectionManager::memory(), options)
    }

    fn from_manager(
        manager: SqliteConnectionManager,
        options: SqliteOptions,
    ) -> Result<Self, HistoryError> {
        let pool = Pool::builder()
            .max_size(options.pool_size.max(1))
            .connection_timeout(options.connection_timeout)
            .build(manager)
            .map_err(storage)?;

        let history = Self { pool };
        history.init_schema()?;
        Ok(history)
    }

    fn get_conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, HistoryError> {
        self.pool.get().map_err(storage)
    }

    fn init_schema(&self) -> Result<(), HistoryError> {
        let conn = self.get_conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS transfers (
                id INTEGER PRIMARY KEY,
                sender_id INTEGER,
                amount INTEGER NOT NULL,
                transfer_type TEXT NOT NULL,
                transfer_subtype TEXT,
                token TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at_ms INTEGER NOT NULL,
                exclude_from_limit_calcs INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_transfers_sender_created
                ON transfers(sender_id, created_at_ms);
            CREATE TABLE IF NOT EXISTS balances (
                user_id INTEGER PRIMARY KEY,
                balance INTEGER NOT NULL
            );",
        )
        .map_err(storage)
    }

    /// Stores a transfer, replacing any row with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the id is out of range or the write fails.
    pub fn record(&self, transfer: &Transfer) -> Result<(), HistoryError> {
        self.insert(&TransferRecord::from(transfer))
    }

    /// Stores a record, replacing any row with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if an id is out of range or the write fails.
    pub fn insert(&self, record: &TransferRecord) -> Result<(), HistoryError> {
        let id = to_sql_id(record.id, "transfer id")?;
        let sender = record
            .sender_id
            .map(|s| to_sql_id(s, "sender id"))
            .transpose()?;

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO transfers
                (id, sender_id, amount, transfer_type, transfer_subtype, token, status,
                 created_at_ms, exclude_from_limit_calcs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                sender,
                record.amount,
                record.transfer_type.as_str(),
                record.transfer_subtype.map(TransferSubtype::as_str),
                record.token,
                record.status.as_str(),
                record.created_at.timestamp_millis(),
                record.exclude_from_limit_calcs,
            ],
        )
        .map_err(storage)?;

        Ok(())
    }

    /// Updates the status of a stored transfer.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::TransferNotFound`] for an unknown id.
    pub fn set_status(&self, id: TransferId, status: TransferStatus) -> Result<(), HistoryError> {
        let sql_id = to_sql_id(id, "transfer id")?;
        let conn = self.get_conn()?;
        let updated = conn
            .execute(
                "UPDATE transfers SET status = ?1 WHERE id = ?2",
                params![status.as_str(), sql_id],
            )
            .map_err(storage)?;

        if updated == 0 {
            return Err(HistoryError::TransferNotFound { id });
        }
        Ok(())
    }

    /// Sets the live balance of a user.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the id is out of range or the write fails.
    pub fn set_balance(&self, user_id: UserId, balance: Amount) -> Result<(), HistoryError> {
        let user = to_sql_id(user_id, "user id")?;
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO balances (user_id, balance) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET balance = excluded.balance",
            params![user, balance],
        )
        .map_err(storage)?;
        Ok(())
    }

    /// Returns a sender's most recent transfers, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the query fails or a row cannot be decoded.
    pub fn get_transfers(
        &self,
        sender_id: UserId,
        limit: usize,
    ) -> Result<Vec<TransferRecord>, HistoryError> {
        let sender = to_sql_id(sender_id, "sender id")?;
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);

        let conn = self.get_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, sender_id, amount, transfer_type, transfer_subtype, token, status,
                        created_at_ms, exclude_from_limit_calcs
                 FROM transfers
                 WHERE sender_id = ?1
                 ORDER BY created_at_ms DESC, id DESC
                 LIMIT ?2",
            )
            .map_err(storage)?;

        let rows = stmt
            .query_map(params![sender, limit_i64], |row| {
                Ok(RawRow {
                    id: row.get(0)?,
                    sender_id: row.get(1)?,
                    amount: row.get(2)?,
                    transfer_type: row.get(3)?,
                    transfer_subtype: row.get(4)?,
                    token: row.get(5)?,
                    status: row.get(6)?,
                    created_at_ms: row.get(7)?,
                    exclude_from_limit_calcs: row.get(8)?,
                })
            })
            .map_err(storage)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(storage)?.decode()?);
        }
        Ok(records)
    }

    /// Deletes transfers created more than `older_than_days` days ago.
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Storage`] if the delete fails.
    pub fn cleanup(&self, older_than_days: u32) -> Result<usize, HistoryError> {
        let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM transfers WHERE created_at_ms < ?1",
            params![cutoff.timestamp_millis()],
        )
        .map_err(storage)
    }

    /// Returns the number of stored transfers.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Storage`] if the query fails.
    pub fn transfer_count(&self) -> Result<u64, HistoryError> {
        let conn = self.get_conn()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM transfers", [], |row| row.get(0))
            .map_err(storage)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

impl TransferHistory for SqliteHistory {
    fn aggregate(&self, filter: &FilterSpec, reducer: Reducer) -> Result<i64, HistoryError> {
        let (clause, values) = filter.to_sql();
        let conn = self.get_conn()?;

        match reducer {
            Reducer::Count => {
                let sql = format!("SELECT COUNT(*) FROM transfers WHERE {clause}");
                conn.query_row(&sql, params_from_iter(values), |row| row.get(0))
                    .map_err(storage)
            }
            // SUM() errors on overflow in SQLite
            Reducer::Sum => {
                let sql = format!("SELECT amount FROM transfers WHERE {clause}");
                let mut stmt = conn.prepare(&sql).map_err(storage)?;
                let amounts = stmt
                    .query_map(params_from_iter(values), |row| row.get::<_, i64>(0))
                    .map_err(storage)?;

                let mut total = 0_i64;
                for amount in amounts {
                    total = total.saturating_add(amount.map_err(storage)?);
                }
                Ok(total)
            }
        }
    }

    fn current_balance(&self, user_id: UserId) -> Result<Amount, HistoryError> {
        let user = to_sql_id(user_id, "user id")?;
        let conn = self.get_conn()?;
        let balance: Option<i64> = conn
            .query_row(
                "SELECT balance FROM balances WHERE user_id = ?1",
                params![user],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage)?;
        Ok(balance.unwrap_or(0))
    }
}

struct RawRow {
    id: i64,
    sender_id: Option<i64>,
    amount: i64,
    transfer_type: String,
    transfer_subtype: Option<String>,
    token: String,
    status: String,
    created_at_ms: i64,
    exclude_from_limit_calcs: bool,
}

impl RawRow {
    fn decode(self) -> Result<TransferRecord, HistoryError> {
        let row_id = self.id;
        let invalid =
            |e: &dyn std::fmt::Display| HistoryError::invalid_record(format!("row {row_id}: {e}"));

        let id = u64::try_from(self.id).map_err(|e| invalid(&e))?;
        let sender_id = self
            .sender_id
            .map(u64::try_from)
            .transpose()
            .map_err(|e| invalid(&e))?;
        let transfer_type = self
            .transfer_type
            .parse::<TransferType>()
            .map_err(|e| invalid(&e))?;
        let transfer_subtype = self
            .transfer_subtype
            .as_deref()
            .map(str::parse::<TransferSubtype>)
            .transpose()
            .map_err(|e| invalid(&e))?;
        let status = self
            .status
            .parse::<TransferStatus>()
            .map_err(|e| invalid(&e))?;
        let created_at = Utc
            .timestamp_millis_opt(self.created_at_ms)
            .single()
            .ok_or_else(|| invalid(&format!("bad timestamp {}", self.created_at_ms)))?;

        Ok(TransferRecord {
            id,
            sender_id,
            amount: self.amount,
            transfer_type,
            transfer_subtype,
            token: self.token,
            status,
            created_at,
            exclude_from_limit_calcs: self.exclude_from_limit_calcs,
        })
    }
}
