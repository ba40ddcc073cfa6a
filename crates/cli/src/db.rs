//! Database initialization, status, and engine construction

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use vaultx_core::money::format_amount;
use vaultx_engine::{JsonlAuditSink, TransferEngine};
use vaultx_persistence::{SequenceRepo, Store, SEQ_TRANSACTION_ID};

/// Initialize the database with schema
pub async fn init_database(db_path: &Path, force: bool) -> Result<()> {
    if force && db_path.exists() {
        std::fs::remove_file(db_path).context("Failed to remove existing database")?;
        // WAL sidecar files, if any
        for suffix in ["-wal", "-shm"] {
            let mut sidecar = db_path.as_os_str().to_os_string();
            sidecar.push(suffix);
            std::fs::remove_file(sidecar).ok();
        }
        println!("🗑️  Removed existing database");
    }

    // Opening applies migrations
    let store = Store::open(db_path)
        .await
        .context("Failed to initialize database")?;
    store.close().await;
    Ok(())
}

/// Show database status
pub async fn show_status(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        println!("❌ Database not found at {:?}", db_path);
        println!("   Run 'vaultx init' to create the database");
        return Ok(());
    }

    let store = Store::open(db_path).await?;
    let engine = TransferEngine::new(store);

    let accounts = engine.account_count().await?;
    let entries = engine.ledger_count().await?;
    let total = engine.total_active_balance().await?;
    let last_id = SequenceRepo::current(engine.store().pool(), SEQ_TRANSACTION_ID).await?;

    println!("📊 Database Status");
    println!("   Path: {:?}", db_path);
    println!();
    println!("   Accounts:       {}", accounts);
    println!("   Ledger entries: {}", entries);
    println!("   Active balance: {}", format_amount(total));
    println!("   Next ledger ID: T-{:05}", last_id + 1);

    engine.store().close().await;
    Ok(())
}

/// Open the store and build an engine auditing into `audit_dir`
pub async fn engine(db_path: &Path, audit_dir: &Path) -> Result<TransferEngine> {
    tracing::debug!(db = ?db_path, audit = ?audit_dir, "opening ledger store");
    let store = Store::open(db_path)
        .await
        .context("Failed to open database. Run 'vaultx init' first.")?;
    let sink = JsonlAuditSink::new(audit_dir).context("Failed to open audit directory")?;
    Ok(TransferEngine::new(store).with_audit_sink(Arc::new(sink)))
}
