//! Multi-horizon statistics report.

use anyhow::{Context, Result};
use chrono::Utc;
use humboldt_lib::prelude::*;
use humboldt_lib::{BitfinexQuote, BitstampQuote, CoinbaseQuote, ItbitQuote};

use crate::config;

/// Prints a pair's statistics report and its current quote.
pub(crate) async fn stats(
    exchange: &str,
    pair: &str,
    database_url: Option<String>,
) -> Result<()> {
    let exchange: Exchange = exchange.parse()?;
    let pair: Pair = pair.parse()?;
    let database_url = config::database_url(database_url)?;
    let store = PgStore::connect(&database_url)
        .await
        .context("database connection failed")?;

    match exchange {
        Exchange::Bitstamp => show::<BitstampQuote>(&store, exchange, &pair).await,
        Exchange::Bitfinex => show::<BitfinexQuote>(&store, exchange, &pair).await,
        Exchange::Itbit => show::<ItbitQuote>(&store, exchange, &pair).await,
        Exchange::Coinbase => show::<CoinbaseQuote>(&store, exchange, &pair).await,
    }
}

/// Loads, computes, and prints one exchange's report.
async fn show<Q: QuoteDocument>(store: &PgStore, exchange: Exchange, pair: &Pair) -> Result<()> {
    let collections = config::series_collections(exchange);
    let report = report::<Q, _>(store, &collections, pair, Utc::now()).await?;
    print!("{report}");

    if let Some(quote) =
        humboldt_lib::current_quote::<Q, _>(store, &collections, pair).await?
    {
        println!(
            "  current: {:.2} (recorded {})",
            quote.price(),
            quote.recorded_at().format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}
