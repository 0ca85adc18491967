//! Process-local lock implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::{LockError, LockLease, RunLock};

/// An entry in the lease table.
#[derive(Debug, Clone, Copy)]
struct Entry {
    token: Uuid,
    /// The name is taken until this instant.
    locked_until: Instant,
    /// Even a released lease keeps the name taken until this instant.
    min_hold_until: Instant,
}

/// Process-local [`RunLock`] with the same lease semantics as the
/// cluster implementation.
///
/// Suitable for single-node deployments and tests. Expired leases are
/// reaped lazily on the next acquisition attempt.
#[derive(Debug, Default)]
pub struct LocalLock {
    entries: Mutex<HashMap<String, Entry>>,
}

impl LocalLock {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RunLock for LocalLock {
    async fn try_acquire(
        &self,
        name: &str,
        min_hold: Duration,
        max_hold: Duration,
    ) -> Result<Option<LockLease>, LockError> {
        let now = Instant::now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| LockError::Backend(e.to_string()))?;
        if let Some(entry) = entries.get(name)
            && entry.locked_until > now
        {
            return Ok(None);
        }
        let token = Uuid::new_v4();
        entries.insert(
            name.to_string(),
            Entry {
                token,
                locked_until: now + max_hold,
                min_hold_until: now + min_hold,
            },
        );
        Ok(Some(LockLease::new(name, token, min_hold)))
    }

    async fn release(&self, lease: LockLease) -> Result<(), LockError> {
        let now = Instant::now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| LockError::Backend(e.to_string()))?;
        if let Some(entry) = entries.get_mut(lease.name()) {
            if entry.token != lease.token() {
                // Superseded after max-hold expiry; nothing to release.
                return Ok(());
            }
            if entry.min_hold_until > now {
                entry.locked_until = entry.min_hold_until;
            } else {
                entries.remove(lease.name());
            }
        }
        Ok(())
    }
}
