//! SQLite backing store: schema row types and repositories.

pub mod repos;
pub mod schema;

pub use repos::{AccountRepo, LedgerRepo, SequenceRepo, SEQ_ACCOUNT_NUMBER, SEQ_TRANSACTION_ID};
pub use schema::{AccountRow, TransactionRow};
