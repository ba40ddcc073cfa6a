//! Money movement commands: deposit, withdraw, transfer

use anyhow::Result;
use rust_decimal::Decimal;
use std::path::Path;
use vaultx_core::money::format_amount;
use vaultx_engine::Receipt;

use crate::db;

/// Deposit funds into an account
pub async fn deposit(
    db_path: &Path,
    audit_dir: &Path,
    account: &str,
    amount: Decimal,
    description: Option<String>,
    key: Option<String>,
) -> Result<()> {
    let engine = db::engine(db_path, audit_dir).await?;
    let receipt = engine
        .deposit(account, amount, description.as_deref(), key.as_deref())
        .await?;

    print_receipt("Deposit", &receipt);

    engine.store().close().await;
    Ok(())
}

/// Withdraw funds from an account
pub async fn withdraw(
    db_path: &Path,
    audit_dir: &Path,
    account: &str,
    amount: Decimal,
    description: Option<String>,
    key: Option<String>,
) -> Result<()> {
    let engine = db::engine(db_path, audit_dir).await?;
    let receipt = engine
        .withdraw(account, amount, description.as_deref(), key.as_deref())
        .await?;

    print_receipt("Withdrawal", &receipt);

    engine.store().close().await;
    Ok(())
}

/// Transfer funds between two accounts. A fresh idempotency key is
/// generated when the caller does not supply one, so retries of the same
/// invocation can be made safe by passing --key.
pub async fn transfer(
    db_path: &Path,
    audit_dir: &Path,
    from: &str,
    to: &str,
    amount: Decimal,
    description: Option<String>,
    key: Option<String>,
) -> Result<()> {
    let engine = db::engine(db_path, audit_dir).await?;
    let key = key.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let receipt = engine
        .transfer(from, to, amount, description.as_deref(), Some(&key))
        .await?;

    print_receipt("Transfer", &receipt);
    println!("   Key:         {}", key);

    engine.store().close().await;
    Ok(())
}

fn print_receipt(operation: &str, receipt: &Receipt) {
    if receipt.duplicate {
        println!("🔁 {} already recorded (idempotent replay)", operation);
        println!("   Transaction: {}", receipt.transaction_id);
        println!("   Amount:      {}", format_amount(receipt.amount));
        return;
    }

    println!("✅ {} successful!", operation);
    println!("   Transaction: {}", receipt.transaction_id);
    if let Some(linked) = &receipt.linked_transaction_id {
        println!("   Linked:      {}", linked);
    }
    println!("   Amount:      {}", format_amount(receipt.amount));
    if let (Some(from), Some(balance)) = (&receipt.from_account, receipt.from_balance) {
        println!("   {} balance: {}", from, format_amount(balance));
    }
    if let (Some(to), Some(balance)) = (&receipt.to_account, receipt.to_balance) {
        println!("   {} balance: {}", to, format_amount(balance));
    }
}
