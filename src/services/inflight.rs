//! Per-key in-flight locks used to coalesce concurrent cache misses

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::cache::CacheKey;

/// Table of per-key async locks.
///
/// Entries hold weak references so an idle key costs nothing once every
/// guard for it is gone; the last guard removes its own entry.
#[derive(Debug, Default)]
pub struct InflightRequests {
    locks: Mutex<HashMap<CacheKey, Weak<AsyncMutex<()>>>>,
}

/// Held while a request for `key` runs the miss path
#[derive(Debug)]
pub struct InflightGuard {
    registry: Arc<InflightRequests>,
    key: CacheKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl InflightRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other request holds `key`, then hold it
    pub async fn acquire(self: &Arc<Self>, key: &CacheKey) -> InflightGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            match locks.get(key).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    locks.insert(key.clone(), Arc::downgrade(&lock));
                    lock
                }
            }
        };

        let guard = lock.lock_owned().await;
        InflightGuard {
            registry: Arc::clone(self),
            key: key.clone(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        let lock = Arc::clone(OwnedMutexGuard::mutex(&guard));
        drop(guard);

        let mut locks = self
            .registry
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Upgrades happen under the table lock, so a count of one means no
        // waiter can still obtain this mutex.
        if Arc::strong_count(&lock) == 1
            && locks
                .get(&self.key)
                .is_some_and(|weak| Weak::ptr_eq(weak, &Arc::downgrade(&lock)))
        {
            locks.remove(&self.key);
        }
    }
}
