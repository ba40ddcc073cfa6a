//! Account lock registry
//!
//! Process-wide pessimistic locks, one per account number. Every
//! balance-mutating operation acquires its guard(s) here before opening
//! a store transaction, and holds them until the transaction has
//! committed or rolled back. Pair acquisition always goes through
//! [`vaultx_core::lock_order`], so two concurrent transfers over the
//! same pair request locks in the same global order and no waiter cycle
//! can form.
//!
//! Waits are bounded: an operation that cannot get its lock within the
//! configured window fails with `LockTimeout` instead of blocking
//! indefinitely.

use crate::error::{EngineError, EngineResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use vaultx_core::{lock_order, AccountNumber};

/// Default bounded wait for a single lock acquisition.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

/// Registry of per-account async locks.
pub struct AccountLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held exclusive access to one account. Dropping releases.
#[derive(Debug)]
pub struct AccountGuard {
    account: AccountNumber,
    _guard: OwnedMutexGuard<()>,
}

impl AccountGuard {
    pub fn account(&self) -> &AccountNumber {
        &self.account
    }
}

impl Default for AccountLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountLocks {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    fn handle(&self, account: &AccountNumber) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().expect("lock registry poisoned");
        map.entry(account.as_str().to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Acquires the lock for one account, waiting at most `wait`.
    pub async fn acquire(
        &self,
        account: &AccountNumber,
        wait: Duration,
    ) -> EngineResult<AccountGuard> {
        let handle = self.handle(account);
        let guard = tokio::time::timeout(wait, handle.lock_owned())
            .await
            .map_err(|_| EngineError::LockTimeout(account.clone()))?;
        Ok(AccountGuard {
            account: account.clone(),
            _guard: guard,
        })
    }

    /// Acquires locks for two distinct accounts in the global lock order,
    /// never in caller-supplied order. Returns guards in acquisition
    /// order; a timeout on either releases anything already held.
    pub async fn acquire_pair(
        &self,
        a: &AccountNumber,
        b: &AccountNumber,
        wait: Duration,
    ) -> EngineResult<(AccountGuard, AccountGuard)> {
        let (first, second) = lock_order(a, b);
        let first_guard = self.acquire(first, wait).await?;
        let second_guard = self.acquire(second, wait).await?;
        Ok((first_guard, second_guard))
    }
}
