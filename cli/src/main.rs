//! Buy Panel CLI - Drive the amount conversion engine from a terminal
//!
//! Quotes typed base-currency amounts against a configured bonding curve,
//! fills the wallet balance, and runs an interactive form session that
//! simulates swaps, including out-of-order asynchronous quotes.

use clap::{Parser, Subcommand};
use colored::Colorize;

mod config;
mod market;
mod panel;
mod render;
mod session;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "buypanel")]
#[command(about = "Buy panel amount engine - quote, validate and simulate token buys", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.config/buypanel/config.toml if present)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Override the wallet balance (base currency, e.g. 2.5)
    #[arg(short, long, global = true)]
    balance: Option<String>,

    /// Simulate a wallet whose balance has not loaded
    #[arg(long, global = true, conflicts_with = "balance")]
    no_balance: bool,

    /// Simulate a disconnected wallet
    #[arg(long, global = true)]
    disconnected: bool,

    /// Print panel state as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote a base-currency amount
    Quote {
        /// Amount to spend, e.g. 1.23456
        amount: String,
    },

    /// Fill the whole wallet balance and quote it
    Max,

    /// Quote an amount and fail unless the swap would be allowed
    Check {
        /// Amount to spend
        amount: String,
    },

    /// Interactive buy form reading commands from stdin
    Session {
        /// Simulated quote latency in milliseconds (0 quotes inline)
        #[arg(long, default_value = "0")]
        quote_latency_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(balance) = cli.balance {
        config.wallet.balance = Some(balance);
    }
    if cli.no_balance {
        config.wallet.balance = None;
    }
    if cli.disconnected {
        config.wallet.connected = false;
    }
    config.validate()?;

    if cli.verbose && !cli.json {
        println!("{} {}", "Market:".bright_cyan(), config.market()?.describe());
        println!(
            "{} {}/{}",
            "Decimals:".bright_cyan(),
            config.token.base_decimals,
            config.token.token_decimals
        );
        println!(
            "{} {}",
            "Balance:".bright_cyan(),
            config.wallet.balance.as_deref().unwrap_or("not loaded")
        );
    }

    match cli.command {
        Commands::Quote { amount } => {
            panel::run_quote(&config, &amount, cli.json)?;
        }
        Commands::Max => {
            panel::run_max(&config, cli.json)?;
        }
        Commands::Check { amount } => {
            panel::run_check(&config, &amount, cli.json)?;
        }
        Commands::Session { quote_latency_ms } => {
            session::run_session(&config, quote_latency_ms, cli.json).await?;
        }
    }

    Ok(())
}
