//! # VaultX Core
//!
//! Pure domain types for the ledger & transfer engine. No I/O here:
//! account numbers and status, two-decimal money validation, ledger
//! record types, and the lock-ordering function every multi-account
//! operation must go through.

pub mod account;
pub mod error;
pub mod lock_order;
pub mod money;
pub mod transaction;

pub use account::{AccountNumber, AccountStatus, AccountType, BankAccount};
pub use error::{CoreError, CoreResult};
pub use lock_order::lock_order;
pub use money::validate_amount;
pub use transaction::{TransactionId, TransactionRecord, TransactionType};
