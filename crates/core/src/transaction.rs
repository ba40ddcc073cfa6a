//! # Transaction Module
//!
//! Ledger record types. Ledger rows are append-only: they are created
//! exactly once, in the same atomic unit as the balance change they
//! document, and no update or delete path exists anywhere.

use crate::account::AccountNumber;
use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction ID prefix: `T-00001`, `T-00002`, ...
pub const TRANSACTION_ID_PREFIX: &str = "T-";

/// A ledger row identifier, unique across the lifetime of the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Builds a transaction ID from a sequence value.
    pub fn from_sequence(value: i64) -> Self {
        Self(format!("{}{:05}", TRANSACTION_ID_PREFIX, value))
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        let digits = s
            .strip_prefix(TRANSACTION_ID_PREFIX)
            .ok_or_else(|| CoreError::MalformedTransactionId(s.to_string()))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::MalformedTransactionId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
    OpenAccount,
    CloseAccount,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdrawal => "WITHDRAWAL",
            TransactionType::TransferOut => "TRANSFER_OUT",
            TransactionType::TransferIn => "TRANSFER_IN",
            TransactionType::OpenAccount => "OPEN_ACCOUNT",
            TransactionType::CloseAccount => "CLOSE_ACCOUNT",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "DEPOSIT" => Ok(TransactionType::Deposit),
            "WITHDRAWAL" => Ok(TransactionType::Withdrawal),
            "TRANSFER_OUT" => Ok(TransactionType::TransferOut),
            "TRANSFER_IN" => Ok(TransactionType::TransferIn),
            "OPEN_ACCOUNT" => Ok(TransactionType::OpenAccount),
            "CLOSE_ACCOUNT" => Ok(TransactionType::CloseAccount),
            other => Err(CoreError::UnknownTransactionType(other.to_string())),
        }
    }

    /// Lifecycle rows carry amount 0; movement rows a positive amount.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            TransactionType::OpenAccount | TransactionType::CloseAccount
        )
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable ledger entry.
///
/// Field population per type:
/// - DEPOSIT / OPEN_ACCOUNT: `to_account` only
/// - WITHDRAWAL / CLOSE_ACCOUNT: `from_account` only
/// - TRANSFER_OUT / TRANSFER_IN: both set on both rows of the linked pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub tx_type: TransactionType,
    pub from_account: Option<AccountNumber>,
    pub to_account: Option<AccountNumber>,
    pub amount: Decimal,
    pub description: String,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.id,
            self.tx_type,
            crate::money::format_amount(self.amount)
        )?;
        if let Some(ref from) = self.from_account {
            write!(f, " from {}", from)?;
        }
        if let Some(ref to) = self.to_account {
            write!(f, " to {}", to)?;
        }
        write!(f, " ({})", self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transaction_id_from_sequence() {
        assert_eq!(TransactionId::from_sequence(1).as_str(), "T-00001");
        assert_eq!(TransactionId::from_sequence(12345).as_str(), "T-12345");
        // Sequences beyond five digits keep growing, never wrap
        assert_eq!(TransactionId::from_sequence(123456).as_str(), "T-123456");
    }

    #[test]
    fn test_transaction_id_parse() {
        assert!(TransactionId::parse("T-00001").is_ok());
        assert!(TransactionId::parse("X-00001").is_err());
        assert!(TransactionId::parse("T-").is_err());
    }

    #[test]
    fn test_type_round_trip() {
        for t in [
            TransactionType::Deposit,
            TransactionType::Withdrawal,
            TransactionType::TransferOut,
            TransactionType::TransferIn,
            TransactionType::OpenAccount,
            TransactionType::CloseAccount,
        ] {
            assert_eq!(TransactionType::parse(t.as_str()).unwrap(), t);
        }
        assert!(TransactionType::parse("WITHDRAW").is_err());
    }

    #[test]
    fn test_lifecycle_types() {
        assert!(TransactionType::OpenAccount.is_lifecycle());
        assert!(TransactionType::CloseAccount.is_lifecycle());
        assert!(!TransactionType::Deposit.is_lifecycle());
        assert!(!TransactionType::TransferOut.is_lifecycle());
    }

    #[test]
    fn test_record_display() {
        let record = TransactionRecord {
            id: TransactionId::from_sequence(7),
            tx_type: TransactionType::TransferOut,
            from_account: Some(AccountNumber::parse("AC-10001").unwrap()),
            to_account: Some(AccountNumber::parse("AC-10002").unwrap()),
            amount: dec!(30.00),
            description: "rent (debit)".to_string(),
            idempotency_key: None,
            created_at: Utc::now(),
        };
        let s = record.to_string();
        assert!(s.contains("T-00007"));
        assert!(s.contains("TRANSFER_OUT"));
        assert!(s.contains("from AC-10001"));
        assert!(s.contains("to AC-10002"));
    }
}
