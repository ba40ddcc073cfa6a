//! Account lifecycle - open and close
//!
//! Opening allocates the account number, inserts the row, and writes the
//! OPEN_ACCOUNT ledger row (plus the initial DEPOSIT row when the
//! opening balance is positive) in one transaction, so a failure partway
//! can never leave an account without its ledger trail. Closing requires
//! an active account with a balance of exactly zero; a closed account is
//! never resurrected.

use crate::error::EngineResult;
use crate::services::{OpenAccountReceipt, Receipt, TransferEngine};
use chrono::Utc;
use rust_decimal::Decimal;
use vaultx_core::money::format_amount;
use vaultx_core::{
    validate_amount, AccountNumber, AccountStatus, AccountType, BankAccount, CoreError,
    TransactionRecord, TransactionType,
};
use vaultx_persistence::{AccountRepo, AccountRow, SequenceRepo, SEQ_ACCOUNT_NUMBER};

/// Branch used when the caller supplies none.
pub const DEFAULT_BRANCH: &str = "Main Branch";

impl TransferEngine {
    /// Opens a new active account and returns its snapshot.
    pub async fn open_account(
        &self,
        customer: &str,
        account_type: AccountType,
        opening_balance: Decimal,
        branch: Option<&str>,
    ) -> EngineResult<OpenAccountReceipt> {
        let result = self
            .open_account_inner(customer, account_type, opening_balance, branch)
            .await;
        let detail = match &result {
            Ok(receipt) => format!(
                "Opened account {} for {} with balance {}",
                receipt.account.account_number,
                customer,
                format_amount(opening_balance)
            ),
            Err(_) => format!("Open account for {} rejected", customer),
        };
        self.record_audit("open_account", Self::outcome_of(&result, false), detail);
        result
    }

    async fn open_account_inner(
        &self,
        customer: &str,
        account_type: AccountType,
        opening_balance: Decimal,
        branch: Option<&str>,
    ) -> EngineResult<OpenAccountReceipt> {
        let opening_balance = if opening_balance.is_zero() {
            Decimal::ZERO
        } else {
            validate_amount(opening_balance)?
        };

        // No account lock needed: the number is allocated inside the
        // transaction, so no other caller can reference it yet.
        let mut tx = self.store().begin().await?;

        let value = SequenceRepo::next(&mut *tx, SEQ_ACCOUNT_NUMBER).await?;
        let account_number = AccountNumber::from_sequence(value);
        let opened_at = Utc::now();

        let account = BankAccount {
            account_number: account_number.clone(),
            customer: customer.to_string(),
            account_type,
            balance: opening_balance,
            status: AccountStatus::Active,
            branch: branch.unwrap_or(DEFAULT_BRANCH).to_string(),
            opened_at,
            closed_at: None,
        };
        AccountRepo::insert(&mut *tx, &AccountRow::from(&account)).await?;

        let open_id = Self::next_transaction_id(&mut tx).await?;
        let open_record = TransactionRecord {
            id: open_id.clone(),
            tx_type: TransactionType::OpenAccount,
            from_account: None,
            to_account: Some(account_number.clone()),
            amount: Decimal::ZERO,
            description: format!("Opened {}", account_type.display_name()),
            idempotency_key: None,
            created_at: opened_at,
        };
        Self::append_record(&mut tx, &open_record).await?;

        let initial_deposit_id = if opening_balance > Decimal::ZERO {
            let deposit_id = Self::next_transaction_id(&mut tx).await?;
            let deposit_record = TransactionRecord {
                id: deposit_id.clone(),
                tx_type: TransactionType::Deposit,
                from_account: None,
                to_account: Some(account_number.clone()),
                amount: opening_balance,
                description: "Initial deposit".to_string(),
                idempotency_key: None,
                created_at: opened_at,
            };
            Self::append_record(&mut tx, &deposit_record).await?;
            Some(deposit_id)
        } else {
            None
        };

        tx.commit().await?;
        tracing::info!(
            account = %account_number,
            customer = %customer,
            balance = %opening_balance,
            "account opened"
        );

        Ok(OpenAccountReceipt {
            account,
            open_transaction_id: open_id,
            initial_deposit_id,
        })
    }

    /// Closes an active account holding exactly zero, appending the
    /// CLOSE_ACCOUNT ledger row in the same transaction.
    pub async fn close_account(&self, account: &str) -> EngineResult<Receipt> {
        let result = self.close_account_inner(account).await;
        self.record_audit(
            "close_account",
            Self::outcome_of(&result, false),
            format!("Close account {}", account),
        );
        result
    }

    async fn close_account_inner(&self, account: &str) -> EngineResult<Receipt> {
        let account = AccountNumber::parse(account)?;

        let guard = self.locks().acquire(&account, self.lock_wait()).await?;

        let result = async {
            let mut tx = self.store().begin().await?;

            let row = Self::load_account(&mut tx, &account).await?;
            Self::require_active(&row)?;
            if row.balance != Decimal::ZERO {
                return Err(CoreError::NonZeroBalance {
                    account: account.to_string(),
                    balance: row.balance,
                }
                .into());
            }

            let closed_at = Utc::now();
            AccountRepo::close(&mut *tx, account.as_str(), closed_at).await?;

            let id = Self::next_transaction_id(&mut tx).await?;
            let record = TransactionRecord {
                id: id.clone(),
                tx_type: TransactionType::CloseAccount,
                from_account: Some(account.clone()),
                to_account: None,
                amount: Decimal::ZERO,
                description: "Account closed".to_string(),
                idempotency_key: None,
                created_at: closed_at,
            };
            Self::append_record(&mut tx, &record).await?;

            tx.commit().await?;
            tracing::info!(account = %account, id = %id, "account closed");

            Ok(Receipt {
                transaction_id: id,
                linked_transaction_id: None,
                tx_type: TransactionType::CloseAccount,
                amount: Decimal::ZERO,
                from_account: Some(account.clone()),
                to_account: None,
                from_balance: Some(Decimal::ZERO),
                to_balance: None,
                duplicate: false,
            })
        }
        .await;
        drop(guard);
        result
    }
}
