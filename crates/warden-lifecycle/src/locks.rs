//! Per-case async locks.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use warden_core::errors::{WardenError, WardenResult};

/// One async mutex per case id, created on first use.
///
/// Serializes transitions on a case within this process; the store's
/// compare-and-swap covers writers outside it.
pub struct CaseLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
    timeout: Duration,
}

impl CaseLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    /// Wait for the case lock, up to the configured timeout.
    pub async fn acquire(&self, case_id: &str) -> WardenResult<OwnedMutexGuard<()>> {
        let lock = self
            .locks
            .entry(case_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        tokio::time::timeout(self.timeout, lock.lock_owned())
            .await
            .map_err(|_| WardenError::LockTimeout {
                case_id: case_id.to_string(),
                after_ms: self.timeout.as_millis() as u64,
            })
    }

    /// Drop locks nobody holds or waits for.
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - self.locks.len()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
