//! The transfer-engine service object
//!
//! Constructed once at process start and passed by handle to every
//! caller; there is no global instance. Owns the store handle, the
//! account-lock registry, and the audit sink. The money-movement
//! operations live in `transfers` and `lifecycle`; this module holds the
//! service itself, the receipt types, and the helpers shared by every
//! atomic unit.

use crate::audit::{AuditEvent, AuditSink, TracingAuditSink};
use crate::error::{EngineError, EngineResult};
use crate::locking::{AccountLocks, DEFAULT_LOCK_WAIT};
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use std::sync::Arc;
use std::time::Duration;
use vaultx_core::{
    AccountNumber, BankAccount, CoreError, TransactionId, TransactionRecord, TransactionType,
};
use vaultx_persistence::{AccountRepo, LedgerRepo, SequenceRepo, Store, SEQ_TRANSACTION_ID};

/// Outcome of a completed money movement.
///
/// For transfers, `transaction_id` is the TRANSFER_OUT row and
/// `linked_transaction_id` the TRANSFER_IN row of the pair. Resulting
/// balances are present only for freshly executed operations; an
/// idempotent replay carries `duplicate = true` and no balances.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub transaction_id: TransactionId,
    pub linked_transaction_id: Option<TransactionId>,
    pub tx_type: TransactionType,
    pub amount: Decimal,
    pub from_account: Option<AccountNumber>,
    pub to_account: Option<AccountNumber>,
    pub from_balance: Option<Decimal>,
    pub to_balance: Option<Decimal>,
    pub duplicate: bool,
}

/// Outcome of opening an account.
#[derive(Debug, Clone)]
pub struct OpenAccountReceipt {
    pub account: BankAccount,
    pub open_transaction_id: TransactionId,
    /// Set when the account was opened with a positive balance
    pub initial_deposit_id: Option<TransactionId>,
}

/// The ledger & transfer engine.
pub struct TransferEngine {
    store: Store,
    locks: AccountLocks,
    audit: Arc<dyn AuditSink>,
    lock_wait: Duration,
}

impl TransferEngine {
    /// Creates an engine over an opened store, auditing through tracing.
    pub fn new(store: Store) -> Self {
        Self {
            store,
            locks: AccountLocks::new(),
            audit: Arc::new(TracingAuditSink),
            lock_wait: DEFAULT_LOCK_WAIT,
        }
    }

    /// Replaces the audit sink.
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// Overrides the bounded lock wait.
    pub fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The per-account lock registry.
    pub fn locks(&self) -> &AccountLocks {
        &self.locks
    }

    pub(crate) fn lock_wait(&self) -> Duration {
        self.lock_wait
    }

    /// Emits one audit event, after commit/rollback, never under locks.
    pub(crate) fn record_audit(&self, operation: &str, outcome: &str, detail: String) {
        self.audit.record(&AuditEvent::new(operation, outcome, detail));
    }

    /// Audit outcome string for a finished operation.
    pub(crate) fn outcome_of<T>(result: &EngineResult<T>, duplicate: bool) -> &'static str {
        match result {
            Ok(_) if duplicate => "duplicate",
            Ok(_) => "ok",
            Err(err) => err.code(),
        }
    }

    /// Reads one account row inside the open transaction, after its lock
    /// is held, so the latest committed value is observed.
    pub(crate) async fn load_account(
        conn: &mut SqliteConnection,
        number: &AccountNumber,
    ) -> EngineResult<BankAccount> {
        let row = AccountRepo::get(&mut *conn, number.as_str())
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(number.to_string()))?;
        Ok(BankAccount::try_from(row)?)
    }

    pub(crate) fn require_active(account: &BankAccount) -> EngineResult<()> {
        if !account.is_active() {
            return Err(CoreError::AccountNotActive(account.account_number.to_string()).into());
        }
        Ok(())
    }

    /// Allocates the next ledger ID inside the caller's transaction.
    pub(crate) async fn next_transaction_id(
        conn: &mut SqliteConnection,
    ) -> EngineResult<TransactionId> {
        let value = SequenceRepo::next(&mut *conn, SEQ_TRANSACTION_ID).await?;
        Ok(TransactionId::from_sequence(value))
    }

    /// Appends one ledger row inside the caller's transaction.
    pub(crate) async fn append_record(
        conn: &mut SqliteConnection,
        record: &TransactionRecord,
    ) -> EngineResult<()> {
        LedgerRepo::append(&mut *conn, &record.into()).await?;
        Ok(())
    }

    /// Looks up a previously recorded outcome for an idempotency key.
    /// A hit means the logical operation already committed; the caller
    /// returns the replayed receipt without touching any balance.
    pub(crate) async fn find_recorded(
        &self,
        idempotency_key: Option<&str>,
    ) -> EngineResult<Option<Receipt>> {
        let Some(key) = idempotency_key else {
            return Ok(None);
        };
        let Some(row) = LedgerRepo::by_idempotency_key(self.store.pool(), key).await? else {
            return Ok(None);
        };
        let record = TransactionRecord::try_from(row)?;
        Ok(Some(Receipt::replayed(record)))
    }

    /// Duplicate recovery for the lost race: the pre-check missed, the
    /// append hit the unique index. Re-reads the winner's row.
    pub(crate) async fn recover_duplicate(
        &self,
        idempotency_key: Option<&str>,
        err: EngineError,
    ) -> EngineResult<Receipt> {
        let is_conflict = matches!(&err, EngineError::Store(e) if e.is_unique_violation());
        if is_conflict {
            if let Some(receipt) = self.find_recorded(idempotency_key).await? {
                return Ok(receipt);
            }
        }
        Err(err)
    }
}

impl Receipt {
    pub(crate) fn replayed(record: TransactionRecord) -> Self {
        Self {
            transaction_id: record.id,
            linked_transaction_id: None,
            tx_type: record.tx_type,
            amount: record.amount,
            from_account: record.from_account,
            to_account: record.to_account,
            from_balance: None,
            to_balance: None,
            duplicate: true,
        }
    }
}
