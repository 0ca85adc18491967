//! One-off rollup pass.

use anyhow::{Context, Result};
use chrono::Utc;
use humboldt_lib::prelude::*;
use humboldt_lib::{BitfinexQuote, BitstampQuote, CoinbaseQuote, ItbitQuote, RollupEngine};
use std::sync::Arc;

use crate::config;

/// Runs one rollup pass for the selected exchange (or all) and exits.
pub(crate) async fn rollup(
    exchange: Option<&str>,
    database_url: Option<String>,
    redis_url: Option<String>,
) -> Result<()> {
    let exchanges: Vec<Exchange> = match exchange {
        Some(name) => vec![name.parse()?],
        None => Exchange::all().to_vec(),
    };

    let database_url = config::database_url(database_url)?;
    let store = Arc::new(
        PgStore::connect(&database_url)
            .await
            .context("database connection failed")?,
    );
    for exchange in &exchanges {
        store.ensure_collection(exchange.raw_collection()).await?;
    }

    match config::redis_url(redis_url) {
        Some(url) => {
            let lock = Arc::new(RedisLock::new(&url).context("redis connection failed")?);
            pass(&store, &lock, &exchanges).await
        }
        None => pass(&store, &Arc::new(LocalLock::new()), &exchanges).await,
    }
}

/// Runs the pass for each exchange with its own quote type.
async fn pass<L: RunLock + 'static>(
    store: &Arc<PgStore>,
    lock: &Arc<L>,
    exchanges: &[Exchange],
) -> Result<()> {
    for exchange in exchanges {
        match exchange {
            Exchange::Bitstamp => run_one::<BitstampQuote, L>(store, lock, *exchange).await?,
            Exchange::Bitfinex => run_one::<BitfinexQuote, L>(store, lock, *exchange).await?,
            Exchange::Itbit => run_one::<ItbitQuote, L>(store, lock, *exchange).await?,
            Exchange::Coinbase => run_one::<CoinbaseQuote, L>(store, lock, *exchange).await?,
        }
    }
    Ok(())
}

/// Runs both granularities for one exchange and prints the outcomes.
async fn run_one<Q: QuoteDocument, L: RunLock + 'static>(
    store: &Arc<PgStore>,
    lock: &Arc<L>,
    exchange: Exchange,
) -> Result<()> {
    let engine = RollupEngine::<Q, _, _>::new(
        Arc::clone(store),
        Arc::clone(lock),
        config::rollup_config(exchange),
    );
    for granularity in Granularity::all() {
        let outcome = engine.run(*granularity, Utc::now()).await?;
        println!("{exchange} {granularity}: {outcome:?}");
    }
    Ok(())
}
