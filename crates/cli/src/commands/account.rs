//! Account management commands

use anyhow::Result;
use std::path::Path;
use vaultx_core::money::format_amount;
use vaultx_core::BankAccount;
use vaultx_engine::TransferEngine;

use crate::db;
use crate::AccountAction;

/// Handle account subcommands
pub async fn handle(db_path: &Path, audit_dir: &Path, action: AccountAction) -> Result<()> {
    let engine = db::engine(db_path, audit_dir).await?;

    match action {
        AccountAction::Open {
            name,
            r#type,
            balance,
            branch,
        } => {
            open_account(&engine, &name, r#type.to_core_type(), balance, branch.as_deref())
                .await?;
        }
        AccountAction::Close { account } => {
            close_account(&engine, &account).await?;
        }
        AccountAction::Show { account } => {
            show_account(&engine, &account).await?;
        }
        AccountAction::List { all } => {
            list_accounts(&engine, all).await?;
        }
    }

    engine.store().close().await;
    Ok(())
}

async fn open_account(
    engine: &TransferEngine,
    name: &str,
    account_type: vaultx_core::AccountType,
    balance: rust_decimal::Decimal,
    branch: Option<&str>,
) -> Result<()> {
    let receipt = engine.open_account(name, account_type, balance, branch).await?;
    let account = &receipt.account;

    println!("✅ Opened {}:", account.account_type.display_name());
    println!("   Account:  {}", account.account_number);
    println!("   Customer: {}", account.customer);
    println!("   Branch:   {}", account.branch);
    println!("   Balance:  {}", format_amount(account.balance));
    println!("   Ledger:   {}", receipt.open_transaction_id);
    if let Some(deposit_id) = &receipt.initial_deposit_id {
        println!("   Initial deposit: {}", deposit_id);
    }

    Ok(())
}

async fn close_account(engine: &TransferEngine, account: &str) -> Result<()> {
    let receipt = engine.close_account(account).await?;

    println!("✅ Closed account {}", account);
    println!("   Ledger: {}", receipt.transaction_id);

    Ok(())
}

async fn show_account(engine: &TransferEngine, account: &str) -> Result<()> {
    let account = engine.account(account).await?;

    println!("📋 Account Details");
    println!("   Account:  {}", account.account_number);
    println!("   Customer: {}", account.customer);
    println!("   Type:     {}", account.account_type.display_name());
    println!("   Status:   {}", account.status.as_str());
    println!("   Branch:   {}", account.branch);
    println!("   Balance:  {}", format_amount(account.balance));
    println!("   Opened:   {}", account.opened_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(closed_at) = account.closed_at {
        println!("   Closed:   {}", closed_at.format("%Y-%m-%d %H:%M:%S"));
    }

    Ok(())
}

async fn list_accounts(engine: &TransferEngine, include_closed: bool) -> Result<()> {
    let accounts = engine.list_accounts(include_closed).await?;

    if accounts.is_empty() {
        println!("No accounts found.");
        return Ok(());
    }

    println!(
        "{:<10} {:<20} {:<16} {:>14} {:<8}",
        "ACCOUNT", "CUSTOMER", "TYPE", "BALANCE", "STATUS"
    );
    println!("{}", "-".repeat(72));
    for account in &accounts {
        print_row(account);
    }

    Ok(())
}

fn print_row(account: &BankAccount) {
    println!(
        "{:<10} {:<20} {:<16} {:>14} {:<8}",
        account.account_number.as_str(),
        account.customer,
        account.account_type.display_name(),
        format_amount(account.balance),
        account.status.as_str()
    );
}
