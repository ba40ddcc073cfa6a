//! # Account Module
//!
//! Account numbers, status, and the in-memory view of an account row.
//! Balances live in the store and are only authoritative when read
//! under lock; `BankAccount` here is a snapshot, never a cache.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account number prefix: `AC-10001`, `AC-10002`, ...
pub const ACCOUNT_NUMBER_PREFIX: &str = "AC-";

/// A validated account number in the fixed `AC-NNNNN` format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Parses and validates an account number.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let digits = s
            .strip_prefix(ACCOUNT_NUMBER_PREFIX)
            .ok_or_else(|| CoreError::MalformedAccountNumber(s.to_string()))?;
        if digits.len() != 5 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::MalformedAccountNumber(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Builds an account number from a sequence value.
    pub fn from_sequence(value: i64) -> Self {
        Self(format!("{}{:05}", ACCOUNT_NUMBER_PREFIX, value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Accepts balance mutation
    Active,
    /// Balance frozen at exactly zero; never resurrected
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "closed" => Ok(AccountStatus::Closed),
            other => Err(CoreError::UnknownAccountStatus(other.to_string())),
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Account product type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Savings,
    Current,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Savings => "savings",
            AccountType::Current => "current",
        }
    }

    pub fn parse(s: &str) -> CoreResult<Self> {
        match s {
            "savings" => Ok(AccountType::Savings),
            "current" => Ok(AccountType::Current),
            other => Err(CoreError::UnknownAccountType(other.to_string())),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AccountType::Savings => "Savings Account",
            AccountType::Current => "Current Account",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of one account row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub account_number: AccountNumber,
    pub customer: String,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub status: AccountStatus,
    pub branch: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl BankAccount {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Whether the account may be closed: active with a zero balance.
    pub fn can_close(&self) -> bool {
        self.is_active() && self.balance == Decimal::ZERO
    }
}

impl fmt::Display for BankAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}, balance: {}, status: {})",
            self.account_number,
            self.customer,
            self.account_type,
            crate::money::format_amount(self.balance),
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_account_number_parse() {
        assert!(AccountNumber::parse("AC-10001").is_ok());
        assert!(AccountNumber::parse("AC-00001").is_ok());

        assert!(AccountNumber::parse("10001").is_err());
        assert!(AccountNumber::parse("AC-1001").is_err());
        assert!(AccountNumber::parse("AC-100001").is_err());
        assert!(AccountNumber::parse("AC-1000x").is_err());
        assert!(AccountNumber::parse("ac-10001").is_err());
        assert!(AccountNumber::parse("").is_err());
    }

    #[test]
    fn test_account_number_from_sequence() {
        assert_eq!(AccountNumber::from_sequence(10001).as_str(), "AC-10001");
        assert_eq!(AccountNumber::from_sequence(10042).as_str(), "AC-10042");
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(AccountStatus::parse("active").unwrap(), AccountStatus::Active);
        assert_eq!(AccountStatus::parse("closed").unwrap(), AccountStatus::Closed);
        assert!(AccountStatus::parse("frozen").is_err());
        assert_eq!(AccountStatus::Closed.as_str(), "closed");
    }

    #[test]
    fn test_account_type_round_trip() {
        assert_eq!(AccountType::parse("savings").unwrap(), AccountType::Savings);
        assert_eq!(AccountType::parse("current").unwrap(), AccountType::Current);
        assert!(AccountType::parse("checking").is_err());
    }

    fn sample(balance: Decimal, status: AccountStatus) -> BankAccount {
        BankAccount {
            account_number: AccountNumber::parse("AC-10001").unwrap(),
            customer: "Alice".to_string(),
            account_type: AccountType::Savings,
            balance,
            status,
            branch: "Main Branch".to_string(),
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    #[test]
    fn test_can_close() {
        assert!(sample(dec!(0), AccountStatus::Active).can_close());
        assert!(!sample(dec!(5.00), AccountStatus::Active).can_close());
        assert!(!sample(dec!(0), AccountStatus::Closed).can_close());
    }
}
