//! Bounded offload for CPU-bound aggregation work.

use std::sync::Arc;
use tokio::sync::Semaphore;

/// Default number of concurrent compute permits.
pub const DEFAULT_COMPUTE_PERMITS: usize = 8;

/// Error from a compute job that panicked or was cancelled.
#[derive(Debug, thiserror::Error)]
#[error("compute task failed: {0}")]
pub struct ComputeError(pub(crate) String);

/// Permit-bounded wrapper around the blocking thread pool.
///
/// Grouping and folding a day's worth of raw quotes is CPU work; running
/// it here keeps it off the executor that drives network polling, and
/// the permit cap keeps concurrent rollup runs from flooding the
/// blocking pool.
#[derive(Debug, Clone)]
pub struct ComputePool {
    permits: Arc<Semaphore>,
}

impl ComputePool {
    /// Creates a pool with the given number of permits.
    #[must_use]
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(permits)),
        }
    }

    /// Runs a CPU-bound job on the blocking pool, waiting for a permit
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the job panicked or the runtime is shutting
    /// down.
    pub async fn run<F, T>(&self, job: F) -> Result<T, ComputeError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| ComputeError(e.to_string()))?;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| ComputeError(e.to_string()))
    }
}

impl Default for ComputePool {
    fn default() -> Self {
        Self::new(DEFAULT_COMPUTE_PERMITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_run_returns_job_result() {
        let pool = ComputePool::new(2);
        let result = pool.run(|| 2 + 2).await.unwrap();
        assert_eq!(result, 4);
    }

    #[tokio::test]
    async fn test_permits_bound_concurrency() {
        let pool = ComputePool::new(1);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs: Vec<_> = (0..4)
            .map(|_| {
                let pool = pool.clone();
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    pool.run(move || {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(20));
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await
                    .unwrap();
                })
            })
            .collect();
        for job in jobs {
            job.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
