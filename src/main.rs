use clap::{Parser, Subcommand};
use explorer::Explorer;
use explorer::config::Config;
use explorer::router::{DEFAULT_BLOCK_LIMIT, DEFAULT_HISTORY_LIMIT, DEFAULT_INTERACTION_DAYS, DEFAULT_PURCHASE_DAYS};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "explorer", about = "Query Solana wallets with structured lookups or plain questions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a question in natural language
    Query {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Account lamports, owner and data size
    Account { address: String },
    /// Recent transactions, newest first
    History {
        address: String,
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },
    /// SPL token balances
    Tokens { address: String },
    /// Most recent blocks
    Blocks {
        #[arg(long, default_value_t = DEFAULT_BLOCK_LIMIT)]
        limit: usize,
    },
    /// Addresses that appeared alongside the wallet
    Interactions {
        address: String,
        #[arg(long, default_value_t = DEFAULT_INTERACTION_DAYS)]
        days: u32,
    },
    /// Token program instructions in the wallet's history
    Purchases {
        address: String,
        #[arg(long, default_value_t = DEFAULT_PURCHASE_DAYS)]
        days: u32,
    },
    /// Helius enhanced view of one transaction
    Enhanced { signature: String },
    /// Service health
    Health {
        #[arg(long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let explorer = Explorer::from_config(&config).await?;

    match cli.command {
        Command::Query { text } => print(&explorer.query(&text.join(" ")).await?),
        Command::Account { address } => print(&explorer.account(&address).await?),
        Command::History { address, limit } => print(&explorer.transactions(&address, limit).await?),
        Command::Tokens { address } => print(&explorer.tokens(&address).await?),
        Command::Blocks { limit } => print(&explorer.blocks(limit).await?),
        Command::Interactions { address, days } => print(&explorer.interactions(&address, days).await?),
        Command::Purchases { address, days } => print(&explorer.purchases(&address, days).await?),
        Command::Enhanced { signature } => print(&explorer.enhanced_transaction(&signature).await?),
        Command::Health { detailed: false } => print(&explorer.health()),
        Command::Health { detailed: true } => print(&explorer.health_detailed().await),
    }
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
