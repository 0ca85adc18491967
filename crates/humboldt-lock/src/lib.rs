//! Run-level mutual exclusion locks for the humboldt quote collector.
//!
//! A rollup run acquires a named lease before touching the store. The
//! lease carries a minimum hold (the name stays taken for at least this
//! long, even if the run finishes early) and a maximum hold (the name
//! frees itself after this long, even if the holder died). Callers must
//! release the lease on every exit path; there is deliberately no other
//! in-process guard state to wedge.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/humboldt/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod local;
#[cfg(feature = "redis")]
mod redis_lock;

pub use local::LocalLock;
#[cfg(feature = "redis")]
pub use redis_lock::RedisLock;

use async_trait::async_trait;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Errors from a lock backend.
///
/// A declined lease is *not* an error; it surfaces as `Ok(None)` from
/// [`RunLock::try_acquire`].
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// The lock backend failed the operation.
    #[error("lock backend error: {0}")]
    Backend(String),
}

/// A held lease on a named lock.
///
/// Leases are handed out by [`RunLock::try_acquire`] and must be given
/// back through [`RunLock::release`].
#[derive(Debug)]
pub struct LockLease {
    name: String,
    token: Uuid,
    acquired_at: Instant,
    min_hold: Duration,
}

impl LockLease {
    /// Creates a lease record. Backends call this on acquisition.
    #[must_use]
    pub fn new(name: &str, token: Uuid, min_hold: Duration) -> Self {
        Self {
            name: name.to_string(),
            token,
            acquired_at: Instant::now(),
            min_hold,
        }
    }

    /// The lock name this lease holds.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The holder token distinguishing this lease.
    #[must_use]
    pub const fn token(&self) -> Uuid {
        self.token
    }

    /// How long the lease has been held.
    #[must_use]
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// Remaining minimum hold, zero once it has elapsed.
    #[must_use]
    pub fn remaining_min_hold(&self) -> Duration {
        self.min_hold.saturating_sub(self.held_for())
    }
}

/// A named cluster (or process) wide mutual-exclusion lock.
///
/// At most one lease exists per name during its hold window. Callers
/// must be written assuming `try_acquire` may simply decline.
#[async_trait]
pub trait RunLock: Send + Sync {
    /// Attempts to take the named lease.
    ///
    /// Returns `Ok(None)` when another holder has it — an expected
    /// outcome under contention, not an error.
    async fn try_acquire(
        &self,
        name: &str,
        min_hold: Duration,
        max_hold: Duration,
    ) -> Result<Option<LockLease>, LockError>;

    /// Releases a lease.
    ///
    /// Releasing before the minimum hold has elapsed keeps the name
    /// taken until it has; releasing later frees it immediately.
    async fn release(&self, lease: LockLease) -> Result<(), LockError>;
}
