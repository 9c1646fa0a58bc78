use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use p2p_trade_tracker::db::{Database, TradeStore, UserStore};
use p2p_trade_tracker::import::ImportService;
use p2p_trade_tracker::models::{Platform, TradeFilters, TradeStatus, TradeType};

#[derive(Parser)]
#[command(name = "p2ptracker", about = "P2P crypto trade tracker")]
struct Cli {
    /// Path to the SQLite database
    #[arg(long, default_value = "trades.db")]
    db: String,

    /// Email identifying the trade owner
    #[arg(long)]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a platform export file (CSV or Excel)
    Import {
        /// Path to the export file
        file: String,
    },
    /// List trades
    List {
        #[arg(long)]
        platform: Option<String>,
        #[arg(long, value_name = "buy|sell")]
        trade_type: Option<String>,
        #[arg(long, value_name = "COMPLETED|CANCELLED")]
        status: Option<String>,
    },
    /// Show profit statistics over completed trades
    Stats,
    /// Delete a trade by id
    Delete { id: i64 },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let db = Database::new(&cli.db).context("failed to open database")?;
    let user = UserStore::new(&db).find_or_create(&cli.user)?;

    match cli.command {
        Command::Import { file } => {
            let bytes = std::fs::read(&file).with_context(|| format!("cannot read {}", file))?;
            let filename = std::path::Path::new(&file)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.clone());

            let outcome = ImportService::new(&db).import(user.id, &filename, &bytes);
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::List {
            platform,
            trade_type,
            status,
        } => {
            let filters = TradeFilters {
                platform: platform.as_deref().and_then(Platform::from_str_opt),
                trade_type: trade_type.as_deref().and_then(TradeType::from_str_opt),
                status: status.as_deref().and_then(TradeStatus::from_str_opt),
            };
            let trades = TradeStore::new(&db).list(user.id, &filters)?;
            for trade in &trades {
                println!(
                    "#{:<6} {:<14} {:<4} {:>14} {:<6} {:>12} {:<4} profit {:>10}  {}",
                    trade.id,
                    trade.platform,
                    trade.trade_type.as_str(),
                    trade.crypto_amount,
                    trade.cryptocurrency,
                    trade.local_currency_amount,
                    trade.local_currency,
                    trade.profit(),
                    trade.status.as_str(),
                );
            }
            println!("{} trades", trades.len());
        }
        Command::Stats => {
            let stats = TradeStore::new(&db).stats(user.id)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Delete { id } => {
            TradeStore::new(&db).delete(user.id, id)?;
            println!("Trade {} deleted", id);
        }
    }

    Ok(())
}
