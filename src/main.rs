//! poe-pricer - Path of Exile item price checker CLI.
//!
//! Prices items against the official trade search with TLS fingerprint
//! emulation for reliable access.

use anyhow::Result;
use clap::{Parser, Subcommand};
use poe_pricer::commands::{PriceCommand, QueryCommand};
use poe_pricer::config::{Config, OutputFormat};
use poe_pricer::pricing::AggregationMode;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "poe-pricer",
    version,
    about = "Price-check Path of Exile items against the official trade search",
    long_about = "Builds a trade search from an item description, rides out rate limits and \
                  query rejections, and summarizes the sampled listing prices."
)]
struct Cli {
    /// League to search in
    #[arg(short, long, global = true, env = "POE_LEAGUE")]
    league: Option<String>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "POE_PROXY")]
    proxy: Option<String>,

    /// Delay between requests in milliseconds
    #[arg(long, global = true, env = "POE_DELAY")]
    delay: Option<u64>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price-check an item description
    #[command(alias = "p")]
    Price {
        /// Item description JSON file, or `-` for stdin
        item: String,

        /// Aggregation mode (median or lowest)
        #[arg(short, long)]
        mode: Option<AggregationMode>,
    },

    /// Print the search query an item description produces
    #[command(alias = "q")]
    Query {
        /// Item description JSON file, or `-` for stdin
        item: String,
    },

    /// List the currencies the aggregator understands
    Currencies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    if let Some(league) = cli.league {
        config.league = league;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }

    match cli.command {
        Commands::Price { item, mode } => {
            if let Some(mode) = mode {
                config.mode = mode;
            }

            let cmd = PriceCommand::new(config);
            let output = cmd.execute(&item).await?;
            println!("{}", output);
        }

        Commands::Query { item } => {
            let output = QueryCommand.execute(&item)?;
            println!("{}", output);
        }

        Commands::Currencies => {
            println!("Retained currencies (first is primary):\n");
            for (index, currency) in config.currencies.iter().enumerate() {
                if index == 0 {
                    println!("{:<10} (primary)", currency);
                } else {
                    println!("{}", currency);
                }
            }
        }
    }

    Ok(())
}
