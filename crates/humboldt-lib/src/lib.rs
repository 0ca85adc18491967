//! Cryptocurrency quote collector with rollup aggregation and
//! multi-horizon statistics.
//!
//! This is a facade crate that re-exports functionality from the
//! humboldt workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use humboldt_lib::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FeedClient::with_defaults()?;
//!     let adapter = Arc::new(BitstampAdapter::new(
//!         client,
//!         vec![Pair::new("btceur")?],
//!     ));
//!     let store = Arc::new(MemoryStore::new());
//!
//!     let coordinator = Arc::new(IngestCoordinator::new(adapter, store));
//!     coordinator.poll(&Pair::new("btceur")?);
//!
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/humboldt/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use humboldt_types::*;

// Re-export exchange adapters
#[cfg(feature = "exchanges")]
pub use humboldt_exchanges::{
    BitfinexAdapter, BitfinexQuote, BitstampAdapter, BitstampQuote, CoinbaseAdapter,
    CoinbaseQuote, Exchange, ExchangeAdapter, FeedClient, FeedConfig, FetchError, ItbitAdapter,
    ItbitQuote,
};

// Re-export the store
#[cfg(feature = "store")]
pub use humboldt_store::{
    HistoryRange, MemoryStore, QuoteStore, SeriesCollections, SeriesSource, StoreError,
    StoreResult, history_quotes,
};

#[cfg(feature = "postgres")]
pub use humboldt_store::PgStore;

// Re-export the run locks
#[cfg(feature = "lock")]
pub use humboldt_lock::{LocalLock, LockError, LockLease, RunLock};

#[cfg(feature = "redis")]
pub use humboldt_lock::RedisLock;

// Re-export ingestion
#[cfg(feature = "ingest")]
pub use humboldt_ingest::{IngestCoordinator, PollScheduler};

// Re-export the rollup engine
#[cfg(feature = "rollup")]
pub use humboldt_rollup::{
    ComputePool, RollupConfig, RollupEngine, RollupError, RollupOutcome, aggregate_window,
    fold_mean,
};

// Re-export statistics
#[cfg(feature = "stats")]
pub use humboldt_stats::{
    Horizon, HorizonStats, PriceRange, StatisticsReport, analyze, current_quote, report,
};

/// Prelude module for convenient imports.
///
/// ```
/// use humboldt_lib::prelude::*;
/// ```
pub mod prelude {
    pub use humboldt_types::{
        DayWindows, Granularity, Pair, QuoteDocument, TickerQuote, TimeWindow, start_of_day,
    };

    #[cfg(feature = "exchanges")]
    pub use humboldt_exchanges::{
        BitfinexAdapter, BitstampAdapter, CoinbaseAdapter, Exchange, ExchangeAdapter, FeedClient,
        ItbitAdapter,
    };

    #[cfg(feature = "store")]
    pub use humboldt_store::{HistoryRange, MemoryStore, QuoteStore, SeriesCollections};

    #[cfg(feature = "postgres")]
    pub use humboldt_store::PgStore;

    #[cfg(feature = "lock")]
    pub use humboldt_lock::{LocalLock, RunLock};

    #[cfg(feature = "redis")]
    pub use humboldt_lock::RedisLock;

    #[cfg(feature = "ingest")]
    pub use humboldt_ingest::{IngestCoordinator, PollScheduler};

    #[cfg(feature = "rollup")]
    pub use humboldt_rollup::{ComputePool, RollupConfig, RollupEngine, RollupOutcome};

    #[cfg(feature = "stats")]
    pub use humboldt_stats::{Horizon, StatisticsReport, analyze, report};
}
