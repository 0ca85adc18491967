//! Staggered periodic poll scheduling.

use humboldt_exchanges::ExchangeAdapter;
use humboldt_store::QuoteStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};
use tracing::debug;

use crate::IngestCoordinator;

/// Runs periodic tasks with per-task start offsets and a broadcast
/// shutdown.
///
/// One loop per (exchange, pair) keeps ticks for different keys
/// independent: a slow or failing pair never delays another.
#[derive(Debug)]
pub struct PollScheduler {
    tasks: Vec<JoinHandle<()>>,
    shutdown: broadcast::Sender<()>,
}

impl PollScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        let (shutdown, _) = broadcast::channel(16);
        Self {
            tasks: Vec::new(),
            shutdown,
        }
    }

    /// Spawns a periodic task that first fires after `initial_delay`
    /// and then every `period` until shutdown.
    pub fn spawn_periodic<F, Fut>(
        &mut self,
        name: String,
        initial_delay: Duration,
        period: Duration,
        task_fn: F,
    ) where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut shutdown_rx = self.shutdown.subscribe();
        let handle = tokio::spawn(async move {
            sleep(initial_delay).await;
            let mut ticker = interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        task_fn().await;
                    }
                    _ = shutdown_rx.recv() => {
                        debug!(task = %name, "periodic task shutting down");
                        break;
                    }
                }
            }
        });
        self.tasks.push(handle);
    }

    /// Spawns one poll loop per pair of the coordinator's adapter,
    /// staggering the start offsets to spread feed load.
    pub fn spawn_pair_polls<A, S>(
        &mut self,
        coordinator: &Arc<IngestCoordinator<A, S>>,
        period: Duration,
        stagger: Duration,
    ) where
        A: ExchangeAdapter,
        S: QuoteStore<A::Quote> + 'static,
    {
        for (position, pair) in coordinator.pairs().into_iter().enumerate() {
            let coordinator = Arc::clone(coordinator);
            let name = format!("poll:{pair}");
            let initial_delay = stagger * (position as u32 + 1);
            let task_pair = pair.clone();
            self.spawn_periodic(name, initial_delay, period, move || {
                let coordinator = Arc::clone(&coordinator);
                let pair = task_pair.clone();
                async move {
                    coordinator.poll(&pair);
                }
            });
        }
    }

    /// Signals shutdown and waits for every task to wind down.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        for handle in self.tasks {
            let _ = handle.await;
        }
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}
