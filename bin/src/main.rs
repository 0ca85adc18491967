//! humboldt CLI - cryptocurrency quote collector with rollups and
//! statistics.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "humboldt")]
#[command(about = "Cryptocurrency quote collector with rollups and statistics", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the collector daemon (ingestion polls + scheduled rollups)
    Run {
        /// PostgreSQL URL. Defaults to $DATABASE_URL.
        #[arg(long)]
        database_url: Option<String>,

        /// Redis URL for the cluster run lock. Defaults to $REDIS_URL;
        /// without one, a process-local lock is used.
        #[arg(long)]
        redis_url: Option<String>,

        /// Seconds between ticker polls per pair
        #[arg(long, default_value = "60")]
        poll_interval: u64,

        /// Seconds of start offset between pair poll loops
        #[arg(long, default_value = "3")]
        stagger: u64,

        /// Seconds between rollup cycles
        #[arg(long, default_value = "86400")]
        rollup_interval: u64,
    },

    /// Run one rollup pass and exit
    Rollup {
        /// Exchange to roll up (bitstamp, bitfinex, itbit, coinbase).
        /// All exchanges when omitted.
        #[arg(short, long)]
        exchange: Option<String>,

        /// PostgreSQL URL. Defaults to $DATABASE_URL.
        #[arg(long)]
        database_url: Option<String>,

        /// Redis URL for the cluster run lock. Defaults to $REDIS_URL.
        #[arg(long)]
        redis_url: Option<String>,
    },

    /// Print a pair's multi-horizon statistics
    Stats {
        /// Exchange identifier (e.g. bitstamp)
        exchange: String,

        /// Pair symbol (e.g. btceur)
        pair: String,

        /// PostgreSQL URL. Defaults to $DATABASE_URL.
        #[arg(long)]
        database_url: Option<String>,
    },

    /// Print a pair's stored quotes for a lookback range
    History {
        /// Exchange identifier (e.g. bitstamp)
        exchange: String,

        /// Pair symbol (e.g. btceur)
        pair: String,

        /// Lookback range (today, 7days, 30days, 90days, 6months, 1year)
        #[arg(short, long, default_value = "7days")]
        range: String,

        /// PostgreSQL URL. Defaults to $DATABASE_URL.
        #[arg(long)]
        database_url: Option<String>,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            database_url,
            redis_url,
            poll_interval,
            stagger,
            rollup_interval,
        } => {
            commands::run::run(commands::run::RunArgs {
                database_url,
                redis_url,
                poll_interval,
                stagger,
                rollup_interval,
            })
            .await
        }
        Commands::Rollup {
            exchange,
            database_url,
            redis_url,
        } => commands::rollup::rollup(exchange.as_deref(), database_url, redis_url).await,
        Commands::Stats {
            exchange,
            pair,
            database_url,
        } => commands::stats::stats(&exchange, &pair, database_url).await,
        Commands::History {
            exchange,
            pair,
            range,
            database_url,
        } => commands::history::history(&exchange, &pair, &range, database_url).await,
    }
}
