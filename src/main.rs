use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ledger_core::{
    init_logging, list_transactions, open_database, summarize, AppConfig, OwnerId,
    SummaryRequest, TransactionQuery,
};

#[derive(Parser, Debug)]
#[command(name = "ledger-core", version, about = "Owner-scoped ledger summaries")]
struct Cli {
    /// Database path (overrides LEDGER_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the schema if it does not exist
    Init,

    /// Print the period-over-period summary for one owner as JSON
    Summary {
        #[arg(long)]
        owner: String,
        /// Window start, yyyy-MM-dd (default: 30 days ago)
        #[arg(long)]
        from: Option<String>,
        /// Window end, yyyy-MM-dd (default: today)
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        account: Option<String>,
    },

    /// Print one owner's transactions in a window as JSON
    Transactions {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        account: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env();
    init_logging(&config.log_filter);

    let db_path = cli.db.unwrap_or(config.db_path);
    let conn = open_database(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    match cli.command {
        Command::Init => {
            println!("✓ Database ready: {}", db_path.display());
        }

        Command::Summary { owner, from, to, account } => {
            let owner = OwnerId::from_identity(Some(owner.as_str()))?;
            let request = SummaryRequest {
                from,
                to,
                account_id: account,
            };
            let summary = summarize(&conn, &owner, &request)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Transactions { owner, from, to, account } => {
            let owner = OwnerId::from_identity(Some(owner.as_str()))?;
            let query = TransactionQuery {
                from,
                to,
                account_id: account,
            };
            let rows = list_transactions(&conn, &owner, &query)?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}
