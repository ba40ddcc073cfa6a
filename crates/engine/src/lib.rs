//! # VaultX Engine
//!
//! The ledger & transfer engine: atomic deposit/withdraw/transfer and
//! account lifecycle over the SQLite ledger store, with per-account
//! pessimistic locks acquired in a fixed global order (deadlock-free by
//! construction) and a fire-and-forget audit sink.
//!
//! ```rust,ignore
//! use vaultx_engine::TransferEngine;
//! use vaultx_persistence::Store;
//!
//! let engine = TransferEngine::new(Store::open("vaultx.db").await?);
//! engine.transfer("AC-10001", "AC-10002", dec!(30.00), Some("rent"), None).await?;
//! ```

pub mod audit;
pub mod error;
pub mod lifecycle;
pub mod locking;
pub mod queries;
pub mod services;
pub mod transfers;

pub use audit::{AuditEvent, AuditSink, JsonlAuditSink, TracingAuditSink};
pub use error::{EngineError, EngineResult, ErrorClass};
pub use lifecycle::DEFAULT_BRANCH;
pub use locking::{AccountGuard, AccountLocks, DEFAULT_LOCK_WAIT};
pub use services::{OpenAccountReceipt, Receipt, TransferEngine};
