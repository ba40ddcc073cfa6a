//! Money movement - deposit, withdraw, transfer
//!
//! Each primitive is one atomic unit: validate input before any lock,
//! acquire the account guard(s) through the registry, open a store
//! transaction, re-read state under lock, mutate balances, append the
//! ledger row(s), commit. Any error before commit drops the transaction,
//! which rolls it back; no partial debit or credit is ever observable.
//!
//! Transfers are recorded as a linked TRANSFER_OUT / TRANSFER_IN pair,
//! both rows carrying both account references, descriptions suffixed
//! " (debit)" and " (credit)". The OUT row carries the idempotency key.

use crate::error::EngineResult;
use crate::services::{Receipt, TransferEngine};
use chrono::Utc;
use rust_decimal::Decimal;
use vaultx_core::money::format_amount;
use vaultx_core::{
    validate_amount, AccountNumber, CoreError, TransactionRecord, TransactionType,
};
use vaultx_persistence::AccountRepo;

impl TransferEngine {
    /// Credits `amount` to an active account and appends one DEPOSIT row.
    pub async fn deposit(
        &self,
        account: &str,
        amount: Decimal,
        description: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> EngineResult<Receipt> {
        let result = self
            .deposit_inner(account, amount, description, idempotency_key)
            .await;
        let duplicate = result.as_ref().map(|r| r.duplicate).unwrap_or(false);
        self.record_audit(
            "deposit",
            Self::outcome_of(&result, duplicate),
            format!("Deposit of {} to account {}", format_amount(amount), account),
        );
        result
    }

    async fn deposit_inner(
        &self,
        account: &str,
        amount: Decimal,
        description: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> EngineResult<Receipt> {
        let amount = validate_amount(amount)?;
        let account = AccountNumber::parse(account)?;

        if let Some(receipt) = self.find_recorded(idempotency_key).await? {
            return Ok(receipt);
        }

        let guard = self.locks().acquire(&account, self.lock_wait()).await?;

        let result = async {
            let mut tx = self.store().begin().await?;

            let row = Self::load_account(&mut tx, &account).await?;
            Self::require_active(&row)?;

            let new_balance = row.balance + amount;
            AccountRepo::update_balance(
                &mut *tx,
                account.as_str(),
                &format_amount(new_balance),
            )
            .await?;

            let id = Self::next_transaction_id(&mut tx).await?;
            let record = TransactionRecord {
                id: id.clone(),
                tx_type: TransactionType::Deposit,
                from_account: None,
                to_account: Some(account.clone()),
                amount,
                description: description.unwrap_or("Deposit").to_string(),
                idempotency_key: idempotency_key.map(str::to_string),
                created_at: Utc::now(),
            };
            Self::append_record(&mut tx, &record).await?;

            tx.commit().await?;
            tracing::info!(account = %account, amount = %amount, id = %id, "deposit committed");

            Ok(Receipt {
                transaction_id: id,
                linked_transaction_id: None,
                tx_type: TransactionType::Deposit,
                amount,
                from_account: None,
                to_account: Some(account.clone()),
                from_balance: None,
                to_balance: Some(new_balance),
                duplicate: false,
            })
        }
        .await;
        drop(guard);

        match result {
            Err(err) => self.recover_duplicate(idempotency_key, err).await,
            ok => ok,
        }
    }

    /// Debits `amount` from an active account with sufficient funds and
    /// appends one WITHDRAWAL row. The balance check and the mutation
    /// happen within the same lock hold.
    pub async fn withdraw(
        &self,
        account: &str,
        amount: Decimal,
        description: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> EngineResult<Receipt> {
        let result = self
            .withdraw_inner(account, amount, description, idempotency_key)
            .await;
        let duplicate = result.as_ref().map(|r| r.duplicate).unwrap_or(false);
        self.record_audit(
            "withdraw",
            Self::outcome_of(&result, duplicate),
            format!(
                "Withdrawal of {} from account {}",
                format_amount(amount),
                account
            ),
        );
        result
    }

    async fn withdraw_inner(
        &self,
        account: &str,
        amount: Decimal,
        description: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> EngineResult<Receipt> {
        let amount = validate_amount(amount)?;
        let account = AccountNumber::parse(account)?;

        if let Some(receipt) = self.find_recorded(idempotency_key).await? {
            return Ok(receipt);
        }

        let guard = self.locks().acquire(&account, self.lock_wait()).await?;

        let result = async {
            let mut tx = self.store().begin().await?;

            let row = Self::load_account(&mut tx, &account).await?;
            Self::require_active(&row)?;
            if row.balance < amount {
                return Err(CoreError::InsufficientFunds {
                    needed: amount,
                    available: row.balance,
                }
                .into());
            }

            let new_balance = row.balance - amount;
            AccountRepo::update_balance(
                &mut *tx,
                account.as_str(),
                &format_amount(new_balance),
            )
            .await?;

            let id = Self::next_transaction_id(&mut tx).await?;
            let record = TransactionRecord {
                id: id.clone(),
                tx_type: TransactionType::Withdrawal,
                from_account: Some(account.clone()),
                to_account: None,
                amount,
                description: description.unwrap_or("Withdrawal").to_string(),
                idempotency_key: idempotency_key.map(str::to_string),
                created_at: Utc::now(),
            };
            Self::append_record(&mut tx, &record).await?;

            tx.commit().await?;
            tracing::info!(account = %account, amount = %amount, id = %id, "withdrawal committed");

            Ok(Receipt {
                transaction_id: id,
                linked_transaction_id: None,
                tx_type: TransactionType::Withdrawal,
                amount,
                from_account: Some(account.clone()),
                to_account: None,
                from_balance: Some(new_balance),
                to_balance: None,
                duplicate: false,
            })
        }
        .await;
        drop(guard);

        match result {
            Err(err) => self.recover_duplicate(idempotency_key, err).await,
            ok => ok,
        }
    }

    /// Moves `amount` between two distinct active accounts: debit the
    /// source, credit the destination, append the linked OUT/IN ledger
    /// pair, all in one atomic unit. Locks are acquired in the global
    /// lock order, never in from/to argument order.
    pub async fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
        description: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> EngineResult<Receipt> {
        let result = self
            .transfer_inner(from, to, amount, description, idempotency_key)
            .await;
        let duplicate = result.as_ref().map(|r| r.duplicate).unwrap_or(false);
        self.record_audit(
            "transfer",
            Self::outcome_of(&result, duplicate),
            format!(
                "Transfer of {} from {} to {}",
                format_amount(amount),
                from,
                to
            ),
        );
        result
    }

    async fn transfer_inner(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
        description: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> EngineResult<Receipt> {
        let amount = validate_amount(amount)?;
        let from = AccountNumber::parse(from)?;
        let to = AccountNumber::parse(to)?;
        if from == to {
            return Err(CoreError::SameAccountTransfer(from.to_string()).into());
        }

        if let Some(receipt) = self.find_recorded(idempotency_key).await? {
            return Ok(receipt);
        }

        let guards = self
            .locks()
            .acquire_pair(&from, &to, self.lock_wait())
            .await?;

        let result = async {
            let mut tx = self.store().begin().await?;

            // Re-validate both sides under lock; earlier reads are stale.
            let from_row = Self::load_account(&mut tx, &from).await?;
            let to_row = Self::load_account(&mut tx, &to).await?;
            Self::require_active(&from_row)?;
            Self::require_active(&to_row)?;
            if from_row.balance < amount {
                return Err(CoreError::InsufficientFunds {
                    needed: amount,
                    available: from_row.balance,
                }
                .into());
            }

            let from_balance = from_row.balance - amount;
            let to_balance = to_row.balance + amount;
            AccountRepo::update_balance(&mut *tx, from.as_str(), &format_amount(from_balance))
                .await?;
            AccountRepo::update_balance(&mut *tx, to.as_str(), &format_amount(to_balance))
                .await?;

            let base_description = description.unwrap_or("Transfer");
            let created_at = Utc::now();

            let out_id = Self::next_transaction_id(&mut tx).await?;
            let out_record = TransactionRecord {
                id: out_id.clone(),
                tx_type: TransactionType::TransferOut,
                from_account: Some(from.clone()),
                to_account: Some(to.clone()),
                amount,
                description: format!("{} (debit)", base_description),
                idempotency_key: idempotency_key.map(str::to_string),
                created_at,
            };
            Self::append_record(&mut tx, &out_record).await?;

            let in_id = Self::next_transaction_id(&mut tx).await?;
            let in_record = TransactionRecord {
                id: in_id.clone(),
                tx_type: TransactionType::TransferIn,
                from_account: Some(from.clone()),
                to_account: Some(to.clone()),
                amount,
                description: format!("{} (credit)", base_description),
                idempotency_key: None,
                created_at,
            };
            Self::append_record(&mut tx, &in_record).await?;

            tx.commit().await?;
            tracing::info!(
                from = %from,
                to = %to,
                amount = %amount,
                out_id = %out_id,
                in_id = %in_id,
                "transfer committed"
            );

            Ok(Receipt {
                transaction_id: out_id,
                linked_transaction_id: Some(in_id),
                tx_type: TransactionType::TransferOut,
                amount,
                from_account: Some(from.clone()),
                to_account: Some(to.clone()),
                from_balance: Some(from_balance),
                to_balance: Some(to_balance),
                duplicate: false,
            })
        }
        .await;
        drop(guards);

        match result {
            Err(err) => self.recover_duplicate(idempotency_key, err).await,
            ok => ok,
        }
    }
}
