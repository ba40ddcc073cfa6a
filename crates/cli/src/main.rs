//! VaultX CLI - Ledger and transfer operations from command line
//!
//! Usage:
//! ```bash
//! vaultx init
//! vaultx account open --name "Alice" --type savings --balance 100.00
//! vaultx deposit AC-10001 50.00 --description "Salary"
//! vaultx withdraw AC-10001 20.00
//! vaultx transfer AC-10001 AC-10002 30.00 --description "Rent"
//! vaultx history AC-10001
//! vaultx account close AC-10002
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

mod commands;
mod db;

use commands::{account, history, money};

/// VaultX - SQLite-backed ledger & transfer engine
#[derive(Parser)]
#[command(name = "vaultx")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database file path
    #[arg(long, default_value = "data/vaultx.db", global = true)]
    pub db: PathBuf,

    /// Audit trail directory path
    #[arg(long, default_value = "data/audit", global = true)]
    pub audit_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Account management
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },

    /// Deposit funds into an account
    Deposit {
        /// Account number (e.g., AC-10001)
        account: String,
        /// Amount to deposit
        amount: Decimal,
        /// Ledger description
        #[arg(long, short)]
        description: Option<String>,
        /// Idempotency key; replaying the same key is a no-op
        #[arg(long, short)]
        key: Option<String>,
    },

    /// Withdraw funds from an account
    Withdraw {
        /// Account number
        account: String,
        /// Amount to withdraw
        amount: Decimal,
        /// Ledger description
        #[arg(long, short)]
        description: Option<String>,
        /// Idempotency key
        #[arg(long, short)]
        key: Option<String>,
    },

    /// Transfer funds between two accounts
    Transfer {
        /// Source account number
        from: String,
        /// Destination account number
        to: String,
        /// Amount to transfer
        amount: Decimal,
        /// Ledger description
        #[arg(long, short)]
        description: Option<String>,
        /// Idempotency key (generated when omitted)
        #[arg(long, short)]
        key: Option<String>,
    },

    /// Show the ledger history of an account
    History {
        /// Account number
        account: String,
        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Initialize the database schema
    Init {
        /// Force re-initialization (drops existing data)
        #[arg(long)]
        force: bool,
    },

    /// Show database status
    Status,
}

#[derive(Subcommand)]
pub enum AccountAction {
    /// Open a new account
    Open {
        /// Customer name
        #[arg(long, short)]
        name: String,
        /// Account type
        #[arg(long, short = 't', default_value = "savings")]
        r#type: AccountTypeArg,
        /// Opening balance
        #[arg(long, short, default_value = "0")]
        balance: Decimal,
        /// Branch name
        #[arg(long)]
        branch: Option<String>,
    },
    /// Close an account (balance must be zero)
    Close {
        /// Account number
        account: String,
    },
    /// Show account details
    Show {
        /// Account number
        account: String,
    },
    /// List accounts
    List {
        /// Include closed accounts
        #[arg(long)]
        all: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum AccountTypeArg {
    Savings,
    Current,
}

impl AccountTypeArg {
    pub fn to_core_type(&self) -> vaultx_core::AccountType {
        match self {
            AccountTypeArg::Savings => vaultx_core::AccountType::Savings,
            AccountTypeArg::Current => vaultx_core::AccountType::Current,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Ensure data directories exist
    if let Some(parent) = cli.db.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    std::fs::create_dir_all(&cli.audit_dir).ok();

    match cli.command {
        Commands::Init { force } => {
            db::init_database(&cli.db, force).await?;
            println!("✅ Database initialized at {:?}", cli.db);
        }

        Commands::Status => {
            db::show_status(&cli.db).await?;
        }

        Commands::Account { action } => {
            account::handle(&cli.db, &cli.audit_dir, action).await?;
        }

        Commands::Deposit {
            account,
            amount,
            description,
            key,
        } => {
            money::deposit(&cli.db, &cli.audit_dir, &account, amount, description, key).await?;
        }

        Commands::Withdraw {
            account,
            amount,
            description,
            key,
        } => {
            money::withdraw(&cli.db, &cli.audit_dir, &account, amount, description, key).await?;
        }

        Commands::Transfer {
            from,
            to,
            amount,
            description,
            key,
        } => {
            money::transfer(&cli.db, &cli.audit_dir, &from, &to, amount, description, key).await?;
        }

        Commands::History { account, json } => {
            history::show(&cli.db, &cli.audit_dir, &account, json).await?;
        }
    }

    Ok(())
}
