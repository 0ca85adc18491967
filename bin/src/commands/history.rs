//! Stored-series lookback listing.

use anyhow::{Context, Result};
use chrono::Utc;
use humboldt_lib::prelude::*;
use humboldt_lib::{
    BitfinexQuote, BitstampQuote, CoinbaseQuote, ItbitQuote, history_quotes,
};

use crate::config;

/// Prints a pair's stored quotes for a lookback range, reading the
/// series the range calls for (raw, hourly, or daily).
pub(crate) async fn history(
    exchange: &str,
    pair: &str,
    range: &str,
    database_url: Option<String>,
) -> Result<()> {
    let exchange: Exchange = exchange.parse()?;
    let pair: Pair = pair.parse()?;
    let range: HistoryRange = range.parse()?;
    let database_url = config::database_url(database_url)?;
    let store = PgStore::connect(&database_url)
        .await
        .context("database connection failed")?;

    match exchange {
        Exchange::Bitstamp => show::<BitstampQuote>(&store, exchange, &pair, range).await,
        Exchange::Bitfinex => show::<BitfinexQuote>(&store, exchange, &pair, range).await,
        Exchange::Itbit => show::<ItbitQuote>(&store, exchange, &pair, range).await,
        Exchange::Coinbase => show::<CoinbaseQuote>(&store, exchange, &pair, range).await,
    }
}

/// Loads and prints one exchange's series rows.
async fn show<Q: QuoteDocument>(
    store: &PgStore,
    exchange: Exchange,
    pair: &Pair,
    range: HistoryRange,
) -> Result<()> {
    let collections = config::series_collections(exchange);
    let quotes = history_quotes::<Q, _>(store, &collections, range, pair, Utc::now()).await?;

    println!(
        "{} {} ({}): {} rows",
        exchange,
        pair,
        range,
        quotes.len()
    );
    for quote in &quotes {
        println!(
            "  {}  price {:>14.4}  volume {:.4}  samples {}",
            quote.recorded_at().format("%Y-%m-%d %H:%M"),
            quote.price(),
            quote.volume(),
            quote.sample_count()
        );
    }
    Ok(())
}
