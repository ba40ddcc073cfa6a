//! Ledger history command

use anyhow::Result;
use std::path::Path;
use vaultx_core::money::format_amount;

use crate::db;

/// Show the ledger history touching one account, newest first
pub async fn show(db_path: &Path, audit_dir: &Path, account: &str, json: bool) -> Result<()> {
    let engine = db::engine(db_path, audit_dir).await?;
    let records = engine.history(account).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        engine.store().close().await;
        return Ok(());
    }

    if records.is_empty() {
        println!("No transactions found for account '{}'", account);
        engine.store().close().await;
        return Ok(());
    }

    println!("📒 Ledger history for {}", account);
    println!(
        "{:<9} {:<14} {:>12} {:<10} {:<10} {:<20} {}",
        "ID", "TYPE", "AMOUNT", "FROM", "TO", "DATE", "DESCRIPTION"
    );
    println!("{}", "-".repeat(100));
    for record in &records {
        println!(
            "{:<9} {:<14} {:>12} {:<10} {:<10} {:<20} {}",
            record.id.as_str(),
            record.tx_type.as_str(),
            format_amount(record.amount),
            record
                .from_account
                .as_ref()
                .map(|a| a.as_str())
                .unwrap_or("-"),
            record.to_account.as_ref().map(|a| a.as_str()).unwrap_or("-"),
            record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.description
        );
    }

    engine.store().close().await;
    Ok(())
}
