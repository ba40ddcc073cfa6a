//! Engine errors
//!
//! One taxonomy for everything a caller can see: validation errors
//! (rejected before any lock), state errors (detected under lock, always
//! rolled back), and infrastructure errors (store/lock trouble). Audit
//! failures are deliberately absent: they are logged, never surfaced.

use thiserror::Error;
use vaultx_core::{AccountNumber, CoreError};
use vaultx_persistence::PersistenceError;

/// Failure class, stable across refactors. Callers branch on this (or on
/// [`EngineError::code`]) rather than on variant details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input; nothing was locked, nothing was touched
    Validation,
    /// Account/balance state read under lock; transaction rolled back
    State,
    /// Store unavailable, lock timeout, commit failure; full rollback
    Infrastructure,
}

/// Transfer-engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("Timed out waiting for lock on account {0}")]
    LockTimeout(AccountNumber),

    #[error("Store error: {0}")]
    Store(#[from] PersistenceError),
}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        EngineError::Store(PersistenceError::from(e))
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// The failure class per the engine's error-handling contract.
    pub fn class(&self) -> ErrorClass {
        match self {
            EngineError::Domain(e) if e.is_validation() => ErrorClass::Validation,
            EngineError::Domain(_) => ErrorClass::State,
            EngineError::LockTimeout(_) | EngineError::Store(_) => ErrorClass::Infrastructure,
        }
    }

    /// Stable error code for caller-facing presentation. No stack traces
    /// or internal detail are part of the contract.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Domain(CoreError::AccountNotFound(_)) => "not-found",
            EngineError::Domain(CoreError::AccountNotActive(_)) => "inactive-account",
            EngineError::Domain(CoreError::NonZeroBalance { .. }) => "non-zero-balance",
            EngineError::Domain(CoreError::InsufficientFunds { .. }) => "insufficient-funds",
            EngineError::Domain(_) => "invalid-input",
            EngineError::LockTimeout(_) | EngineError::Store(_) => "unavailable",
        }
    }
}
