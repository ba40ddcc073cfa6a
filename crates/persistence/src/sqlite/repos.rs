//! Repository implementations for SQLite
//!
//! All functions are generic over the executor, so the same query runs
//! against the pool (plain reads) or inside an open transaction (every
//! balance-mutating path). The ledger surface is append-only by
//! construction: there is no update or delete for `transactions`.

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::schema::{AccountRow, TransactionRow};
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

/// Sequence name for ledger transaction IDs
pub const SEQ_TRANSACTION_ID: &str = "transaction_id";
/// Sequence name for account numbers
pub const SEQ_ACCOUNT_NUMBER: &str = "account_number";

// ============================================================================
// Sequence Repository
// ============================================================================

/// Repository for the `sequences` table.
///
/// `next` must be called inside the same transaction as the write that
/// uses the value; the row update serializes concurrent allocators, so
/// two commits can never carry the same identifier.
pub struct SequenceRepo;

impl SequenceRepo {
    /// Bumps the named sequence and returns the new value.
    pub async fn next<'e, E>(executor: E, name: &str) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) =
            sqlx::query_as("UPDATE sequences SET value = value + 1 WHERE name = ? RETURNING value")
                .bind(name)
                .fetch_optional(executor)
                .await?
                .ok_or_else(|| PersistenceError::not_found("Sequence", name))?;
        Ok(row.0)
    }

    /// Reads the current value without bumping (status/reporting only).
    pub async fn current<'e, E>(executor: E, name: &str) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) = sqlx::query_as("SELECT value FROM sequences WHERE name = ?")
            .bind(name)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Sequence", name))?;
        Ok(row.0)
    }
}

// ============================================================================
// Account Repository
// ============================================================================

/// Repository for the `accounts` table
pub struct AccountRepo;

impl AccountRepo {
    /// Fetches one account row, if present.
    pub async fn get<'e, E>(executor: E, account_number: &str) -> PersistenceResult<Option<AccountRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row =
            sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE account_number = ?")
                .bind(account_number)
                .fetch_optional(executor)
                .await?;
        Ok(row)
    }

    /// Inserts a new account row.
    pub async fn insert<'e, E>(executor: E, account: &AccountRow) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO accounts
                (account_number, customer, account_type, balance, status, branch, opened_at, closed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.account_number)
        .bind(&account.customer)
        .bind(&account.account_type)
        .bind(&account.balance)
        .bind(&account.status)
        .bind(&account.branch)
        .bind(account.opened_at)
        .bind(account.closed_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Writes a new balance for an active account. The caller has
    /// re-read the row under lock in the same transaction; this is the
    /// only balance-mutation statement in the codebase.
    pub async fn update_balance<'e, E>(
        executor: E,
        account_number: &str,
        new_balance: &str,
    ) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE accounts SET balance = ? WHERE account_number = ? AND status = 'active'",
        )
        .bind(new_balance)
        .bind(account_number)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Active account", account_number));
        }
        Ok(())
    }

    /// Marks an active account closed and stamps `closed_at`.
    pub async fn close<'e, E>(
        executor: E,
        account_number: &str,
        closed_at: DateTime<Utc>,
    ) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE accounts SET status = 'closed', closed_at = ? WHERE account_number = ? AND status = 'active'",
        )
        .bind(closed_at)
        .bind(account_number)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Active account", account_number));
        }
        Ok(())
    }

    /// Lists accounts, newest first.
    pub async fn list<'e, E>(executor: E, include_closed: bool) -> PersistenceResult<Vec<AccountRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = if include_closed {
            "SELECT * FROM accounts ORDER BY account_number"
        } else {
            "SELECT * FROM accounts WHERE status = 'active' ORDER BY account_number"
        };
        let rows = sqlx::query_as::<_, AccountRow>(sql).fetch_all(executor).await?;
        Ok(rows)
    }

    /// Counts accounts.
    pub async fn count<'e, E>(executor: E) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(executor)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Ledger Repository
// ============================================================================

/// Repository for the `transactions` ledger table. Append and read only.
pub struct LedgerRepo;

impl LedgerRepo {
    /// Appends one ledger row. Write-once: a duplicate transaction ID or
    /// idempotency key surfaces as a unique violation.
    pub async fn append<'e, E>(executor: E, tx: &TransactionRow) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO transactions
                (transaction_id, tx_type, from_account, to_account, amount, description, idempotency_key, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tx.transaction_id)
        .bind(&tx.tx_type)
        .bind(&tx.from_account)
        .bind(&tx.to_account)
        .bind(&tx.amount)
        .bind(&tx.description)
        .bind(&tx.idempotency_key)
        .bind(tx.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Fetches the ledger row recorded under an idempotency key, if any.
    /// For transfers (two linked rows under one key lookup) the OUT row
    /// carries the key.
    pub async fn by_idempotency_key<'e, E>(
        executor: E,
        key: &str,
    ) -> PersistenceResult<Option<TransactionRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE idempotency_key = ?",
        )
        .bind(key)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Fetches one ledger row by ID.
    pub async fn get<'e, E>(executor: E, transaction_id: &str) -> PersistenceResult<TransactionRow>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE transaction_id = ?")
            .bind(transaction_id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Transaction", transaction_id))
    }

    /// Ledger history touching one account, newest first. The id
    /// tie-break compares length before text: ids are zero-padded to
    /// five digits but keep growing past that, so plain TEXT ordering
    /// would put `T-100000` before `T-99999`.
    pub async fn history_for_account<'e, E>(
        executor: E,
        account_number: &str,
    ) -> PersistenceResult<Vec<TransactionRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM transactions
            WHERE from_account = ? OR to_account = ?
            ORDER BY created_at DESC,
                     length(transaction_id) DESC,
                     transaction_id DESC
            "#,
        )
        .bind(account_number)
        .bind(account_number)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Counts ledger rows.
    pub async fn count<'e, E>(executor: E) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(executor)
            .await?;
        Ok(row.0)
    }
}
