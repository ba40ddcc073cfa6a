//! Database schema definitions
//!
//! Row types for sqlx mapping from SQLite tables. The schema itself is
//! defined in migrations/20260827000000_init.sql. Decimals are stored as
//! TEXT and parsed back on read.

use crate::error::{PersistenceError, PersistenceResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use vaultx_core::{
    AccountNumber, AccountStatus, AccountType, BankAccount, TransactionId, TransactionRecord,
    TransactionType,
};

/// Row type for the `accounts` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AccountRow {
    pub account_number: String,
    pub customer: String,
    pub account_type: String,
    pub balance: String, // Decimal stored as TEXT
    pub status: String,
    pub branch: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Row type for the `transactions` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TransactionRow {
    pub transaction_id: String,
    pub tx_type: String,
    pub from_account: Option<String>,
    pub to_account: Option<String>,
    pub amount: String, // Decimal stored as TEXT
    pub description: String,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn parse_decimal(value: &str) -> PersistenceResult<Decimal> {
    Decimal::from_str(value).map_err(|_| PersistenceError::InvalidDecimal(value.to_string()))
}

// === Conversion implementations ===

impl TryFrom<AccountRow> for BankAccount {
    type Error = PersistenceError;

    fn try_from(row: AccountRow) -> PersistenceResult<Self> {
        Ok(BankAccount {
            account_number: AccountNumber::parse(&row.account_number)?,
            customer: row.customer,
            account_type: AccountType::parse(&row.account_type)?,
            balance: parse_decimal(&row.balance)?,
            status: AccountStatus::parse(&row.status)?,
            branch: row.branch,
            opened_at: row.opened_at,
            closed_at: row.closed_at,
        })
    }
}

impl From<&BankAccount> for AccountRow {
    fn from(account: &BankAccount) -> Self {
        Self {
            account_number: account.account_number.as_str().to_string(),
            customer: account.customer.clone(),
            account_type: account.account_type.as_str().to_string(),
            balance: vaultx_core::money::format_amount(account.balance),
            status: account.status.as_str().to_string(),
            branch: account.branch.clone(),
            opened_at: account.opened_at,
            closed_at: account.closed_at,
        }
    }
}

impl TryFrom<TransactionRow> for TransactionRecord {
    type Error = PersistenceError;

    fn try_from(row: TransactionRow) -> PersistenceResult<Self> {
        let from_account = row
            .from_account
            .as_deref()
            .map(AccountNumber::parse)
            .transpose()?;
        let to_account = row
            .to_account
            .as_deref()
            .map(AccountNumber::parse)
            .transpose()?;
        Ok(TransactionRecord {
            id: TransactionId::parse(&row.transaction_id)?,
            tx_type: TransactionType::parse(&row.tx_type)?,
            from_account,
            to_account,
            amount: parse_decimal(&row.amount)?,
            description: row.description,
            idempotency_key: row.idempotency_key,
            created_at: row.created_at,
        })
    }
}

impl From<&TransactionRecord> for TransactionRow {
    fn from(record: &TransactionRecord) -> Self {
        Self {
            transaction_id: record.id.as_str().to_string(),
            tx_type: record.tx_type.as_str().to_string(),
            from_account: record.from_account.as_ref().map(|a| a.as_str().to_string()),
            to_account: record.to_account.as_ref().map(|a| a.as_str().to_string()),
            amount: vaultx_core::money::format_amount(record.amount),
            description: record.description.clone(),
            idempotency_key: record.idempotency_key.clone(),
            created_at: record.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_account_row_round_trip() {
        let row = AccountRow {
            account_number: "AC-10001".to_string(),
            customer: "Alice".to_string(),
            account_type: "savings".to_string(),
            balance: "100.00".to_string(),
            status: "active".to_string(),
            branch: "Main Branch".to_string(),
            opened_at: Utc::now(),
            closed_at: None,
        };

        let account = BankAccount::try_from(row.clone()).unwrap();
        assert_eq!(account.balance, dec!(100.00));
        assert!(account.is_active());

        let back = AccountRow::from(&account);
        assert_eq!(back.account_number, row.account_number);
        assert_eq!(back.balance, "100.00");
    }

    #[test]
    fn test_corrupt_balance_rejected() {
        let row = AccountRow {
            account_number: "AC-10001".to_string(),
            customer: "Alice".to_string(),
            account_type: "savings".to_string(),
            balance: "not-a-number".to_string(),
            status: "active".to_string(),
            branch: "Main Branch".to_string(),
            opened_at: Utc::now(),
            closed_at: None,
        };
        assert!(matches!(
            BankAccount::try_from(row),
            Err(PersistenceError::InvalidDecimal(_))
        ));
    }

    #[test]
    fn test_transaction_row_round_trip() {
        let row = TransactionRow {
            transaction_id: "T-00001".to_string(),
            tx_type: "TRANSFER_OUT".to_string(),
            from_account: Some("AC-10001".to_string()),
            to_account: Some("AC-10002".to_string()),
            amount: "30.00".to_string(),
            description: "rent (debit)".to_string(),
            idempotency_key: Some("key-1".to_string()),
            created_at: Utc::now(),
        };

        let record = TransactionRecord::try_from(row).unwrap();
        assert_eq!(record.tx_type, TransactionType::TransferOut);
        assert_eq!(record.amount, dec!(30.00));
        assert_eq!(record.idempotency_key.as_deref(), Some("key-1"));
    }
}
