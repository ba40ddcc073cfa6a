//! # VaultX Persistence
//!
//! SQLite ledger store: one table keyed by account number with
//! balance/status columns, one append-only transaction table keyed by
//! transaction ID, and a `sequences` table for race-safe identifier
//! allocation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vaultx_persistence::Store;
//!
//! let store = Store::open("vaultx.db").await?;
//! let mut tx = store.begin().await?;
//! // ... repos against &mut *tx ...
//! tx.commit().await?;
//! ```

pub mod error;
pub mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use sqlite::{
    AccountRepo, AccountRow, LedgerRepo, SequenceRepo, TransactionRow, SEQ_ACCOUNT_NUMBER,
    SEQ_TRANSACTION_ID,
};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::Path;
use std::time::Duration;

/// The ledger store: a SQLite pool with the schema applied.
///
/// The pool is configured with a single connection, so store transactions
/// serialize at the pool rather than failing with SQLITE_BUSY; waiters
/// queue on acquire. Per-account exclusion and lock ordering live in the
/// engine's lock registry, which is always acquired before a connection.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens (creating if missing) a database file and applies migrations.
    pub async fn open<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::debug!("ledger store opened and migrated");
        Ok(store)
    }

    /// Applies pending migrations.
    pub async fn migrate(&self) -> PersistenceResult<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// The underlying pool, for read-only queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begins a store transaction. Dropping the returned transaction
    /// without committing rolls it back; this is the atomic unit every
    /// balance mutation runs inside.
    pub async fn begin(&self) -> PersistenceResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
