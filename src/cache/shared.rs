//! Lock-guarded handle for sharing one cache between threads.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use super::recency::{CacheStats, Displaced, RecencyCache};

/// Cloneable handle to a [`RecencyCache`] behind a single mutex.
///
/// Every `get` reorders the recency list, so reads take the lock
/// exclusively as well.
pub struct SharedCache<K, V> {
    inner: Arc<Mutex<RecencyCache<K, V>>>,
}

impl<K, V> Clone for SharedCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Hash + Eq + Clone, V> SharedCache<K, V> {
    /// Wraps an existing cache.
    pub fn new(cache: RecencyCache<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Runs `f` with exclusive access, for compound operations that must
    /// not interleave with other handles.
    pub fn with<R>(&self, f: impl FnOnce(&mut RecencyCache<K, V>) -> R) -> R {
        f(&mut *self.lock())
    }

    /// Clones the value out, refreshing the key's recency.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.lock().get(key).cloned()
    }

    /// Checks for `key` without touching recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().contains(key)
    }

    /// Stores `value` under `key`, dropping whatever the write displaces.
    pub fn put(&self, key: K, value: V) {
        // Drop displaced values after releasing the lock.
        let displaced = self.lock().push(key, value);
        drop(displaced);
    }

    /// Stores `value` under `key` and hands back what the write displaced.
    pub fn push(&self, key: K, value: V) -> Displaced<K, V> {
        self.lock().push(key, value)
    }

    /// Removes `key`, returning its value.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().remove(key)
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    /// Poisoning is ignored: the cache is consistent between method calls.
    fn lock(&self) -> MutexGuard<'_, RecencyCache<K, V>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<K: Hash + Eq + Clone, V> From<RecencyCache<K, V>> for SharedCache<K, V> {
    fn from(cache: RecencyCache<K, V>) -> Self {
        Self::new(cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::Hasher;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_clones_share_state() {
        let cache = SharedCache::new(RecencyCache::new(4));
        let other = cache.clone();

        cache.put("key".to_string(), 7u32);
        assert_eq!(other.get("key"), Some(7));
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn test_concurrent_puts_respect_capacity() {
        let cache = SharedCache::new(RecencyCache::new(16));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..100u32 {
                        cache.put(t * 1000 + i, i);
                        cache.get(&(t * 1000 + i / 2));
                        assert!(cache.len() <= 16);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 16);
        let stats = cache.stats();
        assert_eq!(stats.insertions, 400);
        assert_eq!(stats.evictions, 400 - 16);
    }

    #[test]
    fn test_with_runs_compound_operation() {
        let cache = SharedCache::from(RecencyCache::new(2));
        cache.put(1, "one");
        cache.put(2, "two");

        let lru = cache.with(|c| {
            c.get(&1);
            c.peek_lru().map(|(k, _)| *k)
        });
        assert_eq!(lru, Some(2));
    }

    static KEY_NINE_HASHES: AtomicUsize = AtomicUsize::new(0);

    /// Key whose `Hash` panics for `9` from the second call onwards.
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct FragileKey(u32);

    impl Hash for FragileKey {
        fn hash<H: Hasher>(&self, state: &mut H) {
            if self.0 == 9 && KEY_NINE_HASHES.fetch_add(1, Ordering::SeqCst) >= 1 {
                panic!("hash failed");
            }
            self.0.hash(state);
        }
    }

    #[test]
    fn test_panicking_hash_leaves_cache_consistent() {
        let cache = SharedCache::new(RecencyCache::new(4));
        cache.put(FragileKey(1), "one");

        let writer = cache.clone();
        let result = thread::spawn(move || writer.put(FragileKey(9), "nine")).join();
        assert!(result.is_err());

        let (len, order) = cache.with(|c| (c.len(), c.keys().map(|k| k.0).collect::<Vec<_>>()));
        assert_eq!(len, order.len());
        assert_eq!(order, vec![1]);

        cache.put(FragileKey(2), "two");
        let order = cache.with(|c| c.keys().map(|k| k.0).collect::<Vec<_>>());
        assert_eq!(order, vec![1, 2]);
        assert_eq!(cache.remove(&FragileKey(1)), Some("one"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_survives_poisoned_lock() {
        let cache = SharedCache::new(RecencyCache::new(2));
        cache.put(1, 1);

        let poisoner = cache.clone();
        let _ = thread::spawn(move || {
            poisoner.with(|_| panic!("boom"));
        })
        .join();

        assert_eq!(cache.get(&1), Some(1));
        assert_eq!(cache.remove(&1), Some(1));
        assert!(cache.is_empty());
    }
}
