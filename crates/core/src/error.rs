//! # Error Module
//!
//! Domain errors for VaultX core types, built with thiserror.

use rust_decimal::Decimal;
use thiserror::Error;

/// Core domain errors.
///
/// Business-rule failures only; infrastructure errors live in the
/// persistence and engine crates.
#[derive(Debug, Error)]
pub enum CoreError {
    // === Money errors ===
    #[error("Insufficient funds: need {needed}, available {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // === Account errors ===
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account is not active: {0}")]
    AccountNotActive(String),

    #[error("Malformed account number: {0}")]
    MalformedAccountNumber(String),

    #[error("Cannot transfer to the same account: {0}")]
    SameAccountTransfer(String),

    #[error("Cannot close account with non-zero balance: {account} holds {balance}")]
    NonZeroBalance { account: String, balance: Decimal },

    // === Ledger errors ===
    #[error("Malformed transaction id: {0}")]
    MalformedTransactionId(String),

    #[error("Unknown transaction type: {0}")]
    UnknownTransactionType(String),

    #[error("Unknown account status: {0}")]
    UnknownAccountStatus(String),

    #[error("Unknown account type: {0}")]
    UnknownAccountType(String),
}

/// Result type alias with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Whether this error was detectable before any lock was taken
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidAmount(_)
                | CoreError::MalformedAccountNumber(_)
                | CoreError::SameAccountTransfer(_)
        )
    }

    /// Whether this error reflects account/balance state read under lock
    pub fn is_state(&self) -> bool {
        matches!(
            self,
            CoreError::InsufficientFunds { .. }
                | CoreError::AccountNotFound(_)
                | CoreError::AccountNotActive(_)
                | CoreError::NonZeroBalance { .. }
        )
    }
}
