//! Redis-backed cluster lock implementation.

use async_trait::async_trait;
use redis::Script;
use std::time::Duration;
use uuid::Uuid;

use crate::{LockError, LockLease, RunLock};

/// Namespace prefix for lock keys.
const KEY_PREFIX: &str = "humboldt:lock:";

/// Release script: deletes (or re-expires) the key only while the
/// holder token still matches, so an expired-and-reacquired lease is
/// never clobbered by its previous holder.
const RELEASE_SCRIPT: &str = r"
if redis.call('get', KEYS[1]) == ARGV[1] then
    if tonumber(ARGV[2]) > 0 then
        return redis.call('pexpire', KEYS[1], ARGV[2])
    else
        return redis.call('del', KEYS[1])
    end
else
    return 0
end";

/// Cluster-wide [`RunLock`] backed by Redis.
///
/// Acquisition is a single `SET NX PX max_hold`; the key expiring is
/// what frees a stuck holder. An early release shortens the key's
/// lifetime to the remaining minimum hold instead of deleting it.
#[derive(Debug, Clone)]
pub struct RedisLock {
    client: redis::Client,
}

impl RedisLock {
    /// Connects the lock to a Redis endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not a valid Redis endpoint.
    pub fn new(url: &str) -> Result<Self, LockError> {
        let client = redis::Client::open(url).map_err(backend)?;
        Ok(Self { client })
    }

    fn key(name: &str) -> String {
        format!("{KEY_PREFIX}{name}")
    }
}

/// Maps a redis error onto the lock error type.
fn backend(err: redis::RedisError) -> LockError {
    LockError::Backend(err.to_string())
}

#[async_trait]
impl RunLock for RedisLock {
    async fn try_acquire(
        &self,
        name: &str,
        min_hold: Duration,
        max_hold: Duration,
    ) -> Result<Option<LockLease>, LockError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend)?;
        let token = Uuid::new_v4();
        let acquired: Option<String> = redis::cmd("SET")
            .arg(Self::key(name))
            .arg(token.to_string())
            .arg("NX")
            .arg("PX")
            .arg(max_hold.as_millis() as u64)
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(acquired.map(|_| LockLease::new(name, token, min_hold)))
    }

    async fn release(&self, lease: LockLease) -> Result<(), LockError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend)?;
        let remaining_ms = lease.remaining_min_hold().as_millis() as u64;
        Script::new(RELEASE_SCRIPT)
            .key(Self::key(lease.name()))
            .arg(lease.token().to_string())
            .arg(remaining_ms)
            .invoke_async::<()>(&mut conn)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
