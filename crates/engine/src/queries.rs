//! Read-only queries
//!
//! Presentation-facing reads for the CLI and other callers. These never
//! take account locks and never mutate; balances they return are
//! snapshots, not authoritative values.

use crate::error::EngineResult;
use crate::services::TransferEngine;
use rust_decimal::Decimal;
use vaultx_core::{AccountNumber, BankAccount, CoreError, TransactionRecord};
use vaultx_persistence::{AccountRepo, LedgerRepo};

impl TransferEngine {
    /// Fetches one account snapshot.
    pub async fn account(&self, account: &str) -> EngineResult<BankAccount> {
        let number = AccountNumber::parse(account)?;
        let row = AccountRepo::get(self.store().pool(), number.as_str())
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(number.to_string()))?;
        Ok(BankAccount::try_from(row)?)
    }

    /// Lists accounts, optionally including closed ones.
    pub async fn list_accounts(&self, include_closed: bool) -> EngineResult<Vec<BankAccount>> {
        let rows = AccountRepo::list(self.store().pool(), include_closed).await?;
        rows.into_iter()
            .map(|row| Ok(BankAccount::try_from(row)?))
            .collect()
    }

    /// Ledger history touching one account, newest first.
    pub async fn history(&self, account: &str) -> EngineResult<Vec<TransactionRecord>> {
        let number = AccountNumber::parse(account)?;
        let rows = LedgerRepo::history_for_account(self.store().pool(), number.as_str()).await?;
        rows.into_iter()
            .map(|row| Ok(TransactionRecord::try_from(row)?))
            .collect()
    }

    /// Sum of balances across active accounts.
    pub async fn total_active_balance(&self) -> EngineResult<Decimal> {
        let accounts = self.list_accounts(false).await?;
        Ok(accounts.iter().map(|a| a.balance).sum())
    }

    /// Total number of ledger rows.
    pub async fn ledger_count(&self) -> EngineResult<i64> {
        Ok(LedgerRepo::count(self.store().pool()).await?)
    }

    /// Total number of accounts, active and closed.
    pub async fn account_count(&self) -> EngineResult<i64> {
        Ok(AccountRepo::count(self.store().pool()).await?)
    }
}
