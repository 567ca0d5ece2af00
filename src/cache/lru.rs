//! Thread-safe bounded LRU cache
//!
//! A `HashMap` from key to [`NodeId`] plus a [`RecencyList`] holding the
//! entries. Both sit behind one mutex, so `get`, `set` and `clear` are
//! linearizable and never expose a state where index and list disagree.
//! The lock is held only for the index/list update itself.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use super::list::{NodeId, RecencyList};

/// Hit/miss/eviction counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub updates: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate in [0.0, 1.0]; 0.0 before the first lookup
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Inner<K, V> {
    index: HashMap<K, NodeId>,
    list: RecencyList<(K, V)>,
    stats: CacheStats,
}

/// Fixed-capacity cache evicting the least recently used entry
pub struct LruCache<K, V> {
    capacity: NonZeroUsize,
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> std::fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("len", &inner.list.len())
            .field("stats", &inner.stats)
            .finish()
    }
}

impl<K, V> LruCache<K, V> {
    /// Create an empty cache holding at most `capacity` entries
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                index: HashMap::with_capacity(capacity.get()),
                list: RecencyList::with_capacity(capacity.get()),
                stats: CacheStats::default(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn len(&self) -> usize {
        self.lock().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    /// Drop every entry, keeping the capacity. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let dropped = inner.list.len();
        inner.index.clear();
        inner.list.clear();
        dropped
    }

    // A panic while holding the lock cannot leave index and list out of step:
    // every mutation below completes before any call that could unwind.
    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Insert or update `key`, making it the most recently used entry.
    ///
    /// Returns `true` when an existing entry was updated. When a new key is
    /// inserted into a full cache the least recently used entry is evicted
    /// first.
    pub fn set(&self, key: K, value: V) -> bool {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if let Some(&id) = inner.index.get(&key) {
            if let Some(entry) = inner.list.get_mut(id) {
                entry.1 = value;
            }
            inner.list.move_to_front(id);
            inner.stats.updates += 1;
            return true;
        }

        if inner.list.len() >= self.capacity.get()
            && let Some((evicted, _)) = inner.list.pop_back()
        {
            inner.index.remove(&evicted);
            inner.stats.evictions += 1;
        }

        let id = inner.list.push_front((key.clone(), value));
        inner.index.insert(key, id);
        inner.stats.insertions += 1;
        false
    }

    /// Look up `key`, promoting it to most recently used on a hit
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let mut guard = self.lock();
        let inner = &mut *guard;

        match inner.index.get(key).copied() {
            Some(id) => {
                inner.list.move_to_front(id);
                inner.stats.hits += 1;
                inner.list.get(id).map(|(_, value)| value.clone())
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// Membership test that does not change recency
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().index.contains_key(key)
    }

    /// Snapshot of the keys from most to least recently used
    pub fn keys_by_recency(&self) -> Vec<K> {
        self.lock().list.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Check that index and list hold exactly the same keys and that the
    /// capacity bound holds. Used by tests after concurrent workloads.
    pub fn invariants_hold(&self) -> bool {
        let inner = self.lock();
        if inner.list.len() > self.capacity.get() || inner.index.len() != inner.list.len() {
            return false;
        }
        inner.list.iter().all(|(key, _)| {
            inner
                .index
                .get(key)
                .and_then(|&id| inner.list.get(id))
                .is_some_and(|(stored, _)| stored == key)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use std::collections::VecDeque;
    use std::sync::Arc;

    fn cache(capacity: usize) -> LruCache<String, String> {
        LruCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_inserting_past_capacity_evicts_oldest() {
        let cache = cache(2);
        assert!(!cache.set("A".into(), "a".into()));
        assert!(!cache.set("B".into(), "b".into()));
        assert!(!cache.set("C".into(), "c".into()));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("A"), None);
        assert_eq!(cache.get("B"), Some("b".to_string()));

        // B was refreshed by the get, so C is now the oldest
        cache.set("D".into(), "d".into());
        assert_eq!(cache.get("C"), None);
        assert_eq!(cache.get("B"), Some("b".to_string()));
        assert_eq!(cache.get("D"), Some("d".to_string()));
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_update_in_place() {
        let cache = cache(3);
        cache.set("K".into(), "v1".into());
        cache.set("X".into(), "x".into());
        assert!(cache.set("K".into(), "v2".into()));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("K"), Some("v2".to_string()));
        assert_eq!(cache.keys_by_recency(), vec!["K".to_string(), "X".to_string()]);
    }

    #[test]
    fn test_repeated_set_refreshes_recency() {
        let cache = cache(2);
        cache.set("A".into(), "a".into());
        cache.set("B".into(), "b".into());
        cache.set("A".into(), "a2".into());
        cache.set("C".into(), "c".into());

        assert!(cache.contains("A"));
        assert!(!cache.contains("B"));
    }

    #[test]
    fn test_get_miss_counts() {
        let cache = cache(1);
        assert_eq!(cache.get("nope"), None);
        cache.set("a".into(), "1".into());
        cache.get("a");

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_contains_does_not_promote() {
        let cache = cache(2);
        cache.set("A".into(), "a".into());
        cache.set("B".into(), "b".into());
        assert!(cache.contains("A"));
        cache.set("C".into(), "c".into());
        assert!(!cache.contains("A"));
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let cache = cache(2);
        cache.set("A".into(), "a".into());
        cache.set("B".into(), "b".into());

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 2);
        assert_eq!(cache.get("A"), None);

        cache.set("C".into(), "c".into());
        cache.set("D".into(), "d".into());
        cache.set("E".into(), "e".into());
        assert_eq!(cache.len(), 2);
        assert!(cache.invariants_hold());
    }

    #[test]
    fn test_capacity_one() {
        let cache = cache(1);
        cache.set("A".into(), "a".into());
        cache.set("B".into(), "b".into());
        assert_eq!(cache.keys_by_recency(), vec!["B".to_string()]);
    }

    #[test]
    fn test_concurrent_workload_keeps_invariants() {
        let cache: Arc<LruCache<u32, u32>> = Arc::new(LruCache::new(NonZeroUsize::new(16).unwrap()));

        let handles: Vec<_> = (0..8u64)
            .map(|seed| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(seed);
                    for _ in 0..5_000 {
                        let key = rng.random_range(0..64u32);
                        match rng.random_range(0..10u8) {
                            0..=4 => {
                                cache.set(key, key * 10);
                            }
                            5..=8 => {
                                if let Some(value) = cache.get(&key) {
                                    assert_eq!(value, key * 10);
                                }
                            }
                            _ => {
                                if key == 0 {
                                    cache.clear();
                                }
                            }
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.invariants_hold());
        assert!(cache.len() <= 16);
    }

    proptest! {
        #[test]
        fn prop_holds_most_recently_touched_keys(
            capacity in 1usize..8,
            ops in prop::collection::vec((any::<bool>(), 0u8..24), 1..200),
        ) {
            let cache: LruCache<u8, u8> = LruCache::new(NonZeroUsize::new(capacity).unwrap());
            // Reference model: front = most recently touched
            let mut model: VecDeque<u8> = VecDeque::new();

            for (is_set, key) in ops {
                if is_set {
                    cache.set(key, key);
                    model.retain(|k| *k != key);
                    model.push_front(key);
                    model.truncate(capacity);
                } else if cache.get(&key).is_some() {
                    model.retain(|k| *k != key);
                    model.push_front(key);
                } else {
                    prop_assert!(!model.contains(&key));
                }
            }

            prop_assert!(cache.invariants_hold());
            prop_assert_eq!(cache.len(), model.len());
            prop_assert_eq!(cache.keys_by_recency(), model.into_iter().collect::<Vec<_>>());
        }
    }
}
