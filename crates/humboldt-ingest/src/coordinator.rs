//! The single-flight ingestion coordinator.

use humboldt_exchanges::ExchangeAdapter;
use humboldt_store::QuoteStore;
use humboldt_types::Pair;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::DEFAULT_INSERT_TIMEOUT;

/// The single in-flight fetch slot for one pair.
#[derive(Debug)]
struct Flight {
    generation: u64,
    handle: JoinHandle<()>,
}

/// The shared pair → flight slot table.
type FlightSlots = Arc<Mutex<HashMap<Pair, Flight>>>;

/// Drives one exchange adapter with at most one outstanding fetch per
/// pair.
///
/// Every poll bumps the pair's generation, aborts the superseded task,
/// and spawns a fresh fetch tagged with the new generation. A fetch
/// that completes after being superseded fails the generation re-check
/// and is discarded before any write, so each tick inserts exactly 0 or
/// 1 raw quote per pair. Failures are logged and skipped; nothing
/// escapes to the scheduler.
#[derive(Debug)]
pub struct IngestCoordinator<A, S> {
    adapter: Arc<A>,
    store: Arc<S>,
    insert_timeout: Duration,
    slots: FlightSlots,
}

impl<A, S> IngestCoordinator<A, S>
where
    A: ExchangeAdapter,
    S: QuoteStore<A::Quote> + 'static,
{
    /// Creates a coordinator for one adapter/store pairing.
    #[must_use]
    pub fn new(adapter: Arc<A>, store: Arc<S>) -> Self {
        Self {
            adapter,
            store,
            insert_timeout: DEFAULT_INSERT_TIMEOUT,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Overrides the insert time bound.
    #[must_use]
    pub fn with_insert_timeout(mut self, insert_timeout: Duration) -> Self {
        self.insert_timeout = insert_timeout;
        self
    }

    /// The pairs this coordinator polls.
    #[must_use]
    pub fn pairs(&self) -> Vec<Pair> {
        self.adapter.pairs().to_vec()
    }

    /// Handles one scheduled tick for a pair.
    ///
    /// Atomically replaces the pair's flight slot: the previous fetch
    /// (finished or not) is cancelled and a new one is spawned.
    pub fn poll(&self, pair: &Pair) {
        let mut slots = self.slots.lock().expect("flight slot mutex poisoned");
        let generation = slots.get(pair).map_or(1, |flight| flight.generation + 1);
        if let Some(previous) = slots.remove(pair) {
            previous.handle.abort();
        }
        let handle = tokio::spawn(run_flight(
            Arc::clone(&self.adapter),
            Arc::clone(&self.store),
            Arc::clone(&self.slots),
            self.insert_timeout,
            pair.clone(),
            generation,
        ));
        slots.insert(pair.clone(), Flight { generation, handle });
    }

    /// Aborts all in-flight fetches.
    pub fn shutdown(&self) {
        let mut slots = self.slots.lock().expect("flight slot mutex poisoned");
        for (_, flight) in slots.drain() {
            flight.handle.abort();
        }
    }
}

/// Fetch, re-validate, store. Runs inside the spawned flight task.
async fn run_flight<A, S>(
    adapter: Arc<A>,
    store: Arc<S>,
    slots: FlightSlots,
    insert_timeout: Duration,
    pair: Pair,
    generation: u64,
) where
    A: ExchangeAdapter,
    S: QuoteStore<A::Quote>,
{
    let exchange = adapter.exchange();
    let quote = match adapter.fetch(&pair).await {
        Ok(quote) => quote,
        Err(err) => {
            warn!(%exchange, %pair, %err, "ticker fetch failed, skipping tick");
            return;
        }
    };

    // The slot may have been handed to a newer fetch while this one was
    // on the wire; a superseded result must never be persisted.
    if !is_current(&slots, &pair, generation) {
        debug!(%exchange, %pair, generation, "superseded fetch discarded");
        return;
    }

    let collection = exchange.raw_collection();
    match timeout(insert_timeout, store.insert_one(collection, &quote)).await {
        Ok(Ok(())) => debug!(%exchange, %pair, "raw quote stored"),
        Ok(Err(err)) => warn!(%exchange, %pair, %err, "raw quote insert failed"),
        Err(_) => warn!(
            %exchange, %pair, timeout = ?insert_timeout,
            "raw quote insert timed out"
        ),
    }
}

/// Returns true if `generation` still owns the pair's slot.
fn is_current(slots: &FlightSlots, pair: &Pair, generation: u64) -> bool {
    slots
        .lock()
        .expect("flight slot mutex poisoned")
        .get(pair)
        .is_some_and(|flight| flight.generation == generation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use humboldt_exchanges::{CoinbaseQuote, Exchange, FetchError};
    use humboldt_store::MemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::sleep;

    /// Adapter whose successive fetches take the configured delays.
    struct StaggeredAdapter {
        pairs: Vec<Pair>,
        delays: Vec<Duration>,
        calls: AtomicU32,
        fail: bool,
    }

    impl StaggeredAdapter {
        fn new(delays: Vec<Duration>) -> Self {
            Self {
                pairs: vec![Pair::new("btceur").unwrap()],
                delays,
                calls: AtomicU32::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(vec![Duration::ZERO])
            }
        }
    }

    #[async_trait]
    impl ExchangeAdapter for StaggeredAdapter {
        type Quote = CoinbaseQuote;

        fn exchange(&self) -> Exchange {
            Exchange::Coinbase
        }

        fn pairs(&self) -> &[Pair] {
            &self.pairs
        }

        async fn fetch(&self, pair: &Pair) -> Result<Self::Quote, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            let delay = self.delays.get(call).copied().unwrap_or(Duration::ZERO);
            sleep(delay).await;
            if self.fail {
                return Err(FetchError::Timeout);
            }
            Ok(CoinbaseQuote {
                pair: pair.clone(),
                recorded_at: Utc::now(),
                rate: (call + 1) as f64,
                samples: 1,
            })
        }
    }

    #[tokio::test]
    async fn test_successful_poll_stores_one_quote() {
        let adapter = Arc::new(StaggeredAdapter::new(vec![Duration::ZERO]));
        let store = Arc::new(MemoryStore::new());
        let coordinator = IngestCoordinator::new(adapter, Arc::clone(&store));

        coordinator.poll(&Pair::new("btceur").unwrap());
        sleep(Duration::from_millis(50)).await;

        assert_eq!(store.count("quote_cb").await, 1);
    }

    #[tokio::test]
    async fn test_second_poll_cancels_first() {
        // First fetch is slow, second is fast; only the second may land.
        let adapter = Arc::new(StaggeredAdapter::new(vec![
            Duration::from_millis(200),
            Duration::from_millis(10),
        ]));
        let store = Arc::new(MemoryStore::new());
        let coordinator = IngestCoordinator::new(adapter, Arc::clone(&store));
        let pair = Pair::new("btceur").unwrap();

        coordinator.poll(&pair);
        sleep(Duration::from_millis(20)).await;
        coordinator.poll(&pair);
        sleep(Duration::from_millis(400)).await;

        assert_eq!(store.count("quote_cb").await, 1);
        let stored = store.find_latest("quote_cb", None).await.unwrap().unwrap();
        assert!(
            (stored.rate - 2.0).abs() < 1e-10,
            "first fetch must not persist"
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_stores_nothing() {
        let adapter = Arc::new(StaggeredAdapter::failing());
        let store = Arc::new(MemoryStore::new());
        let coordinator = IngestCoordinator::new(adapter, Arc::clone(&store));

        coordinator.poll(&Pair::new("btceur").unwrap());
        sleep(Duration::from_millis(50)).await;

        assert_eq!(store.count("quote_cb").await, 0);
    }

    #[tokio::test]
    async fn test_shutdown_aborts_in_flight() {
        let adapter = Arc::new(StaggeredAdapter::new(vec![Duration::from_millis(200)]));
        let store = Arc::new(MemoryStore::new());
        let coordinator = IngestCoordinator::new(adapter, Arc::clone(&store));

        coordinator.poll(&Pair::new("btceur").unwrap());
        coordinator.shutdown();
        sleep(Duration::from_millis(300)).await;

        assert_eq!(store.count("quote_cb").await, 0);
    }
}
