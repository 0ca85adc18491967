//! The rollup engine run loop.

use chrono::{DateTime, TimeDelta, Utc};
use humboldt_lock::{LockError, RunLock};
use humboldt_store::{QuoteStore, SeriesCollections, StoreError, StoreResult};
use humboldt_types::{DayWindows, Granularity, QuoteDocument, TickerQuote, TimeWindow, start_of_day};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{ComputeError, ComputePool, aggregate_window};

/// Configuration for one (exchange, series) rollup engine.
#[derive(Debug, Clone)]
pub struct RollupConfig {
    /// Series label used in lock names and logs (the exchange id).
    pub series: String,
    /// The raw/hourly/daily collections of the series.
    pub collections: SeriesCollections,
    /// Bound on each raw query and bulk write.
    pub query_timeout: Duration,
    /// Bound on each index-ensure; failure is tolerated.
    pub index_timeout: Duration,
    /// Ceiling on a whole run, after which it is abandoned.
    pub run_timeout: Duration,
    /// Minimum lock hold, damping immediate re-trigger thrashing.
    pub lock_min_hold: Duration,
    /// Maximum lock hold, freeing the name if a holder gets stuck.
    pub lock_max_hold: Duration,
}

impl RollupConfig {
    /// Creates a configuration with production timing defaults.
    pub fn new(series: impl Into<String>, collections: SeriesCollections) -> Self {
        let run_timeout = Duration::from_secs(2 * 3600);
        Self {
            series: series.into(),
            collections,
            query_timeout: Duration::from_secs(5),
            index_timeout: Duration::from_secs(300),
            run_timeout,
            lock_min_hold: Duration::from_secs(600),
            // The lease must outlive an abandoned run so a successor
            // never overlaps it.
            lock_max_hold: run_timeout + Duration::from_secs(300),
        }
    }
}

/// How a rollup run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollupOutcome {
    /// Another holder had the lock; nothing ran this cycle.
    Skipped,
    /// The run walked every pending window.
    Completed {
        /// Windows examined this run.
        windows: usize,
        /// Rollup rows written this run.
        rows: usize,
    },
    /// The run hit its ceiling and was abandoned.
    TimedOut,
}

/// Errors that abort a rollup run.
#[derive(Debug, thiserror::Error)]
pub enum RollupError {
    /// A store operation failed outside the tolerated paths.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The lock backend failed.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Grouping/folding failed on the compute pool.
    #[error(transparent)]
    Compute(#[from] ComputeError),
}

/// Generic rollup engine over one exchange's quote type.
///
/// Entry point per (exchange, granularity) key is [`run`](Self::run).
/// Re-running an already-completed series is safe; concurrent runs for
/// the same key are excluded by the lock.
#[derive(Debug)]
pub struct RollupEngine<Q, S, L> {
    store: Arc<S>,
    lock: Arc<L>,
    compute: ComputePool,
    config: RollupConfig,
    _quote: PhantomData<fn() -> Q>,
}

impl<Q, S, L> RollupEngine<Q, S, L>
where
    Q: QuoteDocument,
    S: QuoteStore<Q>,
    L: RunLock,
{
    /// Creates an engine with its own default compute pool.
    #[must_use]
    pub fn new(store: Arc<S>, lock: Arc<L>, config: RollupConfig) -> Self {
        Self::with_compute_pool(store, lock, config, ComputePool::default())
    }

    /// Creates an engine sharing an existing compute pool.
    #[must_use]
    pub fn with_compute_pool(
        store: Arc<S>,
        lock: Arc<L>,
        config: RollupConfig,
        compute: ComputePool,
    ) -> Self {
        Self {
            store,
            lock,
            compute,
            config,
            _quote: PhantomData,
        }
    }

    /// Runs one rollup pass for the given granularity.
    ///
    /// Acquires the run lock first; a declined lease skips the cycle
    /// without error. The pass is bounded by the configured run
    /// ceiling and the lease is released on every exit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock backend fails or an unexpected
    /// store/compute failure aborts the run.
    pub async fn run(
        &self,
        granularity: Granularity,
        now: DateTime<Utc>,
    ) -> Result<RollupOutcome, RollupError> {
        let lock_name = format!("rollup:{}:{}", self.config.series, granularity);
        let Some(lease) = self
            .lock
            .try_acquire(&lock_name, self.config.lock_min_hold, self.config.lock_max_hold)
            .await?
        else {
            debug!(lock = %lock_name, "run lock held elsewhere, skipping cycle");
            return Ok(RollupOutcome::Skipped);
        };

        let outcome = match timeout(
            self.config.run_timeout,
            self.run_locked(granularity, now),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    lock = %lock_name, ceiling = ?self.config.run_timeout,
                    "rollup run hit its ceiling and was abandoned"
                );
                Ok(RollupOutcome::TimedOut)
            }
        };

        if let Err(err) = self.lock.release(lease).await {
            warn!(lock = %lock_name, %err, "lease release failed");
        }
        outcome
    }

    /// The pass proper, executed while holding the lease.
    async fn run_locked(
        &self,
        granularity: Granularity,
        now: DateTime<Utc>,
    ) -> Result<RollupOutcome, RollupError> {
        self.ensure_indexes().await;

        let Some(first_day) = self.first_unprocessed_day(granularity).await? else {
            debug!(series = %self.config.series, "no raw quotes yet, nothing to roll up");
            return Ok(RollupOutcome::Completed { windows: 0, rows: 0 });
        };

        let target = self.target_collection(granularity);
        let mut windows = 0usize;
        let mut rows_written = 0usize;
        for window in DayWindows::until(first_day, start_of_day(now)) {
            let started = std::time::Instant::now();
            let rows = self.aggregate_day(granularity, window).await?;
            if !rows.is_empty() {
                match bounded(
                    self.config.query_timeout,
                    self.store.insert_many(target, &rows),
                )
                .await
                {
                    Ok(()) => rows_written += rows.len(),
                    Err(err) => {
                        warn!(
                            series = %self.config.series, %granularity, %window, %err,
                            "bulk write failed, window left unfilled"
                        );
                    }
                }
            }
            windows += 1;
            info!(
                series = %self.config.series, %granularity, day = %window.begin().date_naive(),
                rows = rows.len(), elapsed_ms = started.elapsed().as_millis() as u64,
                "window rolled up"
            );
        }

        Ok(RollupOutcome::Completed {
            windows,
            rows: rows_written,
        })
    }

    /// Ensures the timestamp index on both rollup collections.
    ///
    /// Index maintenance failing must not stop the pass; failures are
    /// logged and the run proceeds.
    async fn ensure_indexes(&self) {
        for collection in [
            self.config.collections.hourly.as_str(),
            self.config.collections.daily.as_str(),
        ] {
            if let Err(err) = bounded(
                self.config.index_timeout,
                self.store.ensure_index(collection, "recorded_at"),
            )
            .await
            {
                info!(%collection, %err, "ensure_index failed, proceeding without it");
            }
        }
    }

    /// Finds the day start of the earliest window with no rollup row:
    /// the day after the newest rollup row, or the earliest raw
    /// quote's day when the series has never been rolled up.
    async fn first_unprocessed_day(
        &self,
        granularity: Granularity,
    ) -> Result<Option<DateTime<Utc>>, RollupError> {
        let target = self.target_collection(granularity);
        let newest: Option<Q> = bounded(
            self.config.query_timeout,
            self.store.find_latest(target, None),
        )
        .await?;
        if let Some(row) = newest {
            return Ok(Some(start_of_day(row.recorded_at()) + TimeDelta::days(1)));
        }
        let earliest = bounded(
            self.config.query_timeout,
            self.store.earliest_recorded_at(&self.config.collections.raw),
        )
        .await?;
        Ok(earliest.map(start_of_day))
    }

    /// Loads one day of raw quotes and folds it on the compute pool.
    ///
    /// A failed or timed-out raw query is logged and treated as an
    /// empty day; the window still advances.
    async fn aggregate_day(
        &self,
        granularity: Granularity,
        window: TimeWindow,
    ) -> Result<Vec<Q>, RollupError> {
        let quotes = match bounded(
            self.config.query_timeout,
            self.store
                .find_range(&self.config.collections.raw, window, None),
        )
        .await
        {
            Ok(quotes) => quotes,
            Err(err) => {
                warn!(
                    series = %self.config.series, %window, %err,
                    "raw query failed, window treated as empty"
                );
                Vec::new()
            }
        };
        if quotes.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .compute
            .run(move || aggregate_window(granularity, window, quotes))
            .await?;
        Ok(rows)
    }

    /// The collection a granularity writes into.
    fn target_collection(&self, granularity: Granularity) -> &str {
        match granularity {
            Granularity::Hour => &self.config.collections.hourly,
            Granularity::Day => &self.config.collections.daily,
        }
    }
}

/// Applies a time bound to a store operation, mapping expiry onto the
/// store's timeout error.
async fn bounded<T>(
    limit: Duration,
    operation: impl Future<Output = StoreResult<T>>,
) -> StoreResult<T> {
    match timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use humboldt_exchanges::CoinbaseQuote;
    use humboldt_lock::LocalLock;
    use humboldt_store::MemoryStore;
    use humboldt_types::Pair;

    type TestEngine = RollupEngine<CoinbaseQuote, MemoryStore<CoinbaseQuote>, LocalLock>;

    fn test_config() -> RollupConfig {
        let mut config = RollupConfig::new(
            "coinbase",
            SeriesCollections::new("quote_cb", "quote_cb_hour", "quote_cb_day"),
        );
        config.lock_min_hold = Duration::ZERO;
        config
    }

    fn engine(store: &Arc<MemoryStore<CoinbaseQuote>>, lock: &Arc<LocalLock>) -> TestEngine {
        RollupEngine::new(Arc::clone(store), Arc::clone(lock), test_config())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn quote(days_ago: i64, hour: u32, minute: u32, rate: f64) -> CoinbaseQuote {
        CoinbaseQuote {
            pair: Pair::new("btceur").unwrap(),
            recorded_at: start_of_day(now()) - TimeDelta::days(days_ago)
                + TimeDelta::hours(i64::from(hour))
                + TimeDelta::minutes(i64::from(minute)),
            rate,
            samples: 1,
        }
    }

    /// Three quotes per day for the given day offsets, plus today.
    async fn seed_days(store: &MemoryStore<CoinbaseQuote>, days_ago: &[i64]) {
        for &day in days_ago {
            for (minute, rate) in [(0, 10.0), (20, 20.0), (40, 30.0)] {
                store
                    .insert_one("quote_cb", &quote(day, 9, minute, rate))
                    .await
                    .unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_daily_pass_covers_all_full_days() {
        let store = Arc::new(MemoryStore::new());
        let lock = Arc::new(LocalLock::new());
        // Raw data spans five days including today.
        seed_days(&store, &[4, 3, 2, 1, 0]).await;

        let outcome = engine(&store, &lock).run(Granularity::Day, now()).await.unwrap();

        // Four full days rolled up; today stays raw.
        assert_eq!(outcome, RollupOutcome::Completed { windows: 4, rows: 4 });
        assert_eq!(store.count("quote_cb_day").await, 4);

        let newest = store.find_latest("quote_cb_day", None).await.unwrap().unwrap();
        assert_eq!(newest.recorded_at, start_of_day(now()) - TimeDelta::days(1));
        assert!((newest.rate - 20.0).abs() < 1e-9);
        assert_eq!(newest.samples, 3);
    }

    #[tokio::test]
    async fn test_rerun_finds_nothing_pending() {
        let store = Arc::new(MemoryStore::new());
        let lock = Arc::new(LocalLock::new());
        seed_days(&store, &[2, 1]).await;

        let engine = engine(&store, &lock);
        engine.run(Granularity::Day, now()).await.unwrap();
        let second = engine.run(Granularity::Day, now()).await.unwrap();

        assert_eq!(second, RollupOutcome::Completed { windows: 0, rows: 0 });
        assert_eq!(store.count("quote_cb_day").await, 2);
    }

    #[tokio::test]
    async fn test_hourly_pass_rolls_qualifying_hours() {
        let store = Arc::new(MemoryStore::new());
        let lock = Arc::new(LocalLock::new());
        // Yesterday: three quotes in hour 9, two in hour 14.
        seed_days(&store, &[1]).await;
        store.insert_one("quote_cb", &quote(1, 14, 0, 40.0)).await.unwrap();
        store.insert_one("quote_cb", &quote(1, 14, 30, 50.0)).await.unwrap();

        let outcome = engine(&store, &lock).run(Granularity::Hour, now()).await.unwrap();

        assert_eq!(outcome, RollupOutcome::Completed { windows: 1, rows: 1 });
        let row = store.find_latest("quote_cb_hour", None).await.unwrap().unwrap();
        assert_eq!(
            row.recorded_at,
            start_of_day(now()) - TimeDelta::days(1) + TimeDelta::hours(9)
        );
    }

    #[tokio::test]
    async fn test_empty_store_completes_without_windows() {
        let store = Arc::new(MemoryStore::new());
        let lock = Arc::new(LocalLock::new());
        let outcome = engine(&store, &lock).run(Granularity::Day, now()).await.unwrap();
        assert_eq!(outcome, RollupOutcome::Completed { windows: 0, rows: 0 });
    }

    #[tokio::test]
    async fn test_run_ensures_indexes() {
        let store = Arc::new(MemoryStore::new());
        let lock = Arc::new(LocalLock::new());
        engine(&store, &lock).run(Granularity::Day, now()).await.unwrap();
        assert!(store.has_index("quote_cb_hour", "recorded_at").await);
        assert!(store.has_index("quote_cb_day", "recorded_at").await);
    }

    #[tokio::test]
    async fn test_held_lock_skips_run() {
        let store = Arc::new(MemoryStore::new());
        let lock = Arc::new(LocalLock::new());
        seed_days(&store, &[1]).await;

        let lease = lock
            .try_acquire("rollup:coinbase:day", Duration::ZERO, Duration::from_secs(60))
            .await
            .unwrap()
            .unwrap();
        let outcome = engine(&store, &lock).run(Granularity::Day, now()).await.unwrap();
        assert_eq!(outcome, RollupOutcome::Skipped);
        assert_eq!(store.count("quote_cb_day").await, 0);

        lock.release(lease).await.unwrap();
        let outcome = engine(&store, &lock).run(Granularity::Day, now()).await.unwrap();
        assert_eq!(outcome, RollupOutcome::Completed { windows: 1, rows: 1 });
    }

    #[tokio::test]
    async fn test_concurrent_runs_exclude_each_other() {
        let store = Arc::new(MemoryStore::new());
        let lock = Arc::new(LocalLock::new());
        seed_days(&store, &[1]).await;

        let mut config = test_config();
        // The min hold keeps the name taken even if the winner finishes
        // before the loser tries.
        config.lock_min_hold = Duration::from_millis(500);
        let engine = RollupEngine::<CoinbaseQuote, _, _>::new(
            Arc::clone(&store),
            Arc::clone(&lock),
            config,
        );

        let (first, second) = tokio::join!(
            engine.run(Granularity::Day, now()),
            engine.run(Granularity::Day, now()),
        );
        let outcomes = [first.unwrap(), second.unwrap()];

        assert!(outcomes.contains(&RollupOutcome::Skipped));
        assert!(
            outcomes
                .iter()
                .any(|o| matches!(o, RollupOutcome::Completed { windows: 1, .. }))
        );
        assert_eq!(store.count("quote_cb_day").await, 1);
    }
}
