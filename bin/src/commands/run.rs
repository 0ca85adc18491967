//! The collector daemon: ingestion polls plus scheduled rollups.

use anyhow::{Context, Result};
use chrono::Utc;
use humboldt_lib::prelude::*;
use humboldt_lib::{
    BitfinexQuote, BitstampQuote, CoinbaseQuote, ItbitQuote, RollupEngine,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::config;

/// Arguments for the `run` command.
pub(crate) struct RunArgs {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub poll_interval: u64,
    pub stagger: u64,
    pub rollup_interval: u64,
}

/// The resolved daemon timings.
#[derive(Clone, Copy)]
struct Schedule {
    poll_interval: Duration,
    stagger: Duration,
    rollup_interval: Duration,
}

/// Wires the store, adapters, coordinators, and rollup engines, then
/// runs until Ctrl-C.
pub(crate) async fn run(args: RunArgs) -> Result<()> {
    let RunArgs {
        database_url,
        redis_url,
        poll_interval,
        stagger,
        rollup_interval,
    } = args;
    let schedule = Schedule {
        poll_interval: Duration::from_secs(poll_interval),
        stagger: Duration::from_secs(stagger),
        rollup_interval: Duration::from_secs(rollup_interval),
    };
    let database_url = config::database_url(database_url)?;
    let store = Arc::new(
        PgStore::connect(&database_url)
            .await
            .context("database connection failed")?,
    );
    for exchange in Exchange::all() {
        for collection in [
            exchange.raw_collection(),
            exchange.hourly_collection(),
            exchange.daily_collection(),
        ] {
            store
                .ensure_collection(collection)
                .await
                .with_context(|| format!("creating collection {collection}"))?;
        }
    }

    match config::redis_url(redis_url) {
        Some(url) => {
            info!("using redis run lock");
            let lock = Arc::new(RedisLock::new(&url).context("redis connection failed")?);
            run_with_lock(store, lock, schedule).await
        }
        None => {
            info!("no redis endpoint configured, using process-local run lock");
            run_with_lock(store, Arc::new(LocalLock::new()), schedule).await
        }
    }
}

/// The daemon proper, generic over the lock backend.
async fn run_with_lock<L: RunLock + 'static>(
    store: Arc<PgStore>,
    lock: Arc<L>,
    schedule: Schedule,
) -> Result<()> {
    let client = FeedClient::with_defaults().context("building feed client")?;
    let mut scheduler = PollScheduler::new();

    let bitstamp = Arc::new(IngestCoordinator::new(
        Arc::new(BitstampAdapter::new(
            client.clone(),
            config::default_pairs(Exchange::Bitstamp),
        )),
        Arc::clone(&store),
    ));
    let bitfinex = Arc::new(IngestCoordinator::new(
        Arc::new(BitfinexAdapter::new(
            client.clone(),
            config::default_pairs(Exchange::Bitfinex),
        )),
        Arc::clone(&store),
    ));
    let itbit = Arc::new(IngestCoordinator::new(
        Arc::new(ItbitAdapter::new(
            client.clone(),
            config::default_pairs(Exchange::Itbit),
        )),
        Arc::clone(&store),
    ));
    let coinbase = Arc::new(IngestCoordinator::new(
        Arc::new(CoinbaseAdapter::new(
            client,
            config::default_pairs(Exchange::Coinbase),
        )),
        Arc::clone(&store),
    ));
    scheduler.spawn_pair_polls(&bitstamp, schedule.poll_interval, schedule.stagger);
    scheduler.spawn_pair_polls(&bitfinex, schedule.poll_interval, schedule.stagger);
    scheduler.spawn_pair_polls(&itbit, schedule.poll_interval, schedule.stagger);
    scheduler.spawn_pair_polls(&coinbase, schedule.poll_interval, schedule.stagger);

    // One compute pool shared by every engine keeps the aggregation
    // offload bounded globally, not per exchange.
    let compute = ComputePool::default();
    let bs_engine = Arc::new(RollupEngine::<BitstampQuote, _, _>::with_compute_pool(
        Arc::clone(&store),
        Arc::clone(&lock),
        config::rollup_config(Exchange::Bitstamp),
        compute.clone(),
    ));
    let bf_engine = Arc::new(RollupEngine::<BitfinexQuote, _, _>::with_compute_pool(
        Arc::clone(&store),
        Arc::clone(&lock),
        config::rollup_config(Exchange::Bitfinex),
        compute.clone(),
    ));
    let ib_engine = Arc::new(RollupEngine::<ItbitQuote, _, _>::with_compute_pool(
        Arc::clone(&store),
        Arc::clone(&lock),
        config::rollup_config(Exchange::Itbit),
        compute.clone(),
    ));
    let cb_engine = Arc::new(RollupEngine::<CoinbaseQuote, _, _>::with_compute_pool(
        Arc::clone(&store),
        Arc::clone(&lock),
        config::rollup_config(Exchange::Coinbase),
        compute,
    ));

    let rollup_initial = Duration::from_secs(60);
    scheduler.spawn_periodic(
        "rollup".to_string(),
        rollup_initial,
        schedule.rollup_interval,
        move || {
            let bs = Arc::clone(&bs_engine);
            let bf = Arc::clone(&bf_engine);
            let ib = Arc::clone(&ib_engine);
            let cb = Arc::clone(&cb_engine);
            async move {
                run_series(&bs).await;
                run_series(&bf).await;
                run_series(&ib).await;
                run_series(&cb).await;
            }
        },
    );

    info!("humboldt collector running, Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    scheduler.shutdown().await;
    bitstamp.shutdown();
    bitfinex.shutdown();
    itbit.shutdown();
    coinbase.shutdown();
    Ok(())
}

/// Runs both granularities of one engine, logging outcomes.
async fn run_series<Q, S, L>(engine: &RollupEngine<Q, S, L>)
where
    Q: QuoteDocument,
    S: QuoteStore<Q>,
    L: RunLock,
{
    for granularity in Granularity::all() {
        match engine.run(*granularity, Utc::now()).await {
            Ok(outcome) => info!(%granularity, ?outcome, "rollup cycle finished"),
            Err(err) => error!(%granularity, %err, "rollup cycle failed"),
        }
    }
}
