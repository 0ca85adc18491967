//! Connection and schedule configuration.

use anyhow::{Context, Result};
use humboldt_lib::prelude::*;
use humboldt_lib::RollupConfig;

/// Resolves the database URL from a flag or `$DATABASE_URL`.
pub(crate) fn database_url(flag: Option<String>) -> Result<String> {
    flag.or_else(|| std::env::var("DATABASE_URL").ok())
        .context("no database URL; pass --database-url or set DATABASE_URL")
}

/// Resolves the Redis URL from a flag or `$REDIS_URL`, if any.
pub(crate) fn redis_url(flag: Option<String>) -> Option<String> {
    flag.or_else(|| std::env::var("REDIS_URL").ok())
}

/// The pairs each exchange is polled for by default.
pub(crate) fn default_pairs(exchange: Exchange) -> Vec<Pair> {
    let symbols: &[&str] = match exchange {
        Exchange::Bitstamp => &[
            "btceur", "etheur", "ltceur", "xrpeur", "btcusd", "ethusd", "ltcusd", "xrpusd",
        ],
        Exchange::Bitfinex => &["btcusd", "ethusd", "ltcusd", "xrpusd"],
        Exchange::Itbit => &["btcusd"],
        Exchange::Coinbase => &["btcusd", "btceur"],
    };
    symbols
        .iter()
        .map(|s| Pair::new(s).expect("default pair symbols are valid"))
        .collect()
}

/// The collection names of an exchange's series.
pub(crate) fn series_collections(exchange: Exchange) -> SeriesCollections {
    SeriesCollections::new(
        exchange.raw_collection(),
        exchange.hourly_collection(),
        exchange.daily_collection(),
    )
}

/// Rollup engine configuration for an exchange, production timings.
pub(crate) fn rollup_config(exchange: Exchange) -> RollupConfig {
    RollupConfig::new(exchange.as_str(), series_collections(exchange))
}
