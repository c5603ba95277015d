//! Capacity-bounded recency cache.
//!
//! Entries live in a slot arena threaded by an index-linked doubly-linked
//! list running from least- to most-recently used. A `HashMap<K, usize>`
//! maps each key to its slot, so lookup, refresh, insertion and eviction are
//! all O(1) amortized. Vacated slots go on a free list and are reused.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::types::config::{CacheConfig, OverwritePolicy};
use crate::CacheResult;

/// Null link.
const NIL: usize = usize::MAX;

/// Upper bound on up-front allocation; larger caches grow on demand.
const PREALLOC_LIMIT: usize = 1024;

#[derive(Debug)]
struct Slot<K, V> {
    entry: Option<(K, V)>,
    prev: usize,
    next: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    insertions: u64,
    updates: u64,
    evictions: u64,
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Current number of entries.
    pub size: usize,

    /// Maximum number of entries.
    pub capacity: usize,

    /// Lookups that found their key.
    pub hits: u64,

    /// Lookups that did not.
    pub misses: u64,

    /// New keys stored.
    pub insertions: u64,

    /// Values replaced under an existing key.
    pub updates: u64,

    /// Entries dropped to respect capacity.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculates the hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// What a write pushed out of the cache.
///
/// Under [`OverwritePolicy::Literal`] one write can both evict another key
/// and replace the value of its own key, so both fields may be set.
#[derive(Debug, PartialEq, Eq)]
pub struct Displaced<K, V> {
    /// Entry removed from the least-recently-used end.
    pub evicted: Option<(K, V)>,

    /// Previous value of the written key.
    pub replaced: Option<V>,
}

impl<K, V> Displaced<K, V> {
    /// True when the write displaced nothing.
    pub fn is_empty(&self) -> bool {
        self.evicted.is_none() && self.replaced.is_none()
    }
}

/// A key→value store holding at most `capacity` entries, evicting the
/// least-recently-used entry when a write would exceed it.
///
/// `get` counts as a use. How a write to an existing key behaves is set by
/// the cache's [`OverwritePolicy`].
///
/// The cache is not synchronized; wrap it in a
/// [`SharedCache`](super::SharedCache) to share it between threads.
pub struct RecencyCache<K, V> {
    capacity: usize,
    policy: OverwritePolicy,
    index: HashMap<K, usize>,
    slots: Vec<Slot<K, V>>,
    free: Vec<usize>,
    lru: usize,
    mru: usize,
    counters: Counters,
}

impl<K, V> std::fmt::Debug for RecencyCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecencyCache")
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("len", &self.index.len())
            .finish()
    }
}

impl<K: Hash + Eq + Clone, V> RecencyCache<K, V> {
    /// Creates an empty cache with the default [`OverwritePolicy`].
    ///
    /// A capacity of zero is valid: every write is stored and immediately
    /// evicted.
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, OverwritePolicy::default())
    }

    /// Creates an empty cache with an explicit overwrite policy.
    pub fn with_policy(capacity: usize, policy: OverwritePolicy) -> Self {
        let prealloc = capacity.min(PREALLOC_LIMIT);
        Self {
            capacity,
            policy,
            index: HashMap::with_capacity(prealloc),
            slots: Vec::with_capacity(prealloc),
            free: Vec::new(),
            lru: NIL,
            mru: NIL,
            counters: Counters::default(),
        }
    }

    /// Creates a cache from configuration, failing on a negative capacity.
    pub fn from_config(config: &CacheConfig) -> CacheResult<Self> {
        let capacity = config.validate()?;
        Ok(Self::with_policy(capacity, config.policy))
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How writes to existing keys are handled.
    pub fn policy(&self) -> OverwritePolicy {
        self.policy
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Looks up `key`, marking it most-recently used when present.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(idx) = self.index.get(key).copied() else {
            self.counters.misses += 1;
            return None;
        };
        self.counters.hits += 1;
        self.move_to_mru(idx);
        self.slots[idx].entry.as_ref().map(|(_, v)| v)
    }

    /// Mutable variant of [`get`](Self::get); also refreshes recency.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(idx) = self.index.get(key).copied() else {
            self.counters.misses += 1;
            return None;
        };
        self.counters.hits += 1;
        self.move_to_mru(idx);
        self.slots[idx].entry.as_mut().map(|(_, v)| v)
    }

    /// Looks up `key` without touching recency or statistics.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.index.get(key)?;
        self.slots[idx].entry.as_ref().map(|(_, v)| v)
    }

    /// Checks for `key` without touching recency or statistics.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Stores `value` under `key`, dropping whatever the write displaces.
    pub fn put(&mut self, key: K, value: V) {
        let _ = self.push(key, value);
    }

    /// Stores `value` under `key` and hands back what the write displaced.
    pub fn push(&mut self, key: K, value: V) -> Displaced<K, V> {
        let mut displaced = match self.policy {
            OverwritePolicy::Refresh => self.write_refreshing(key, value),
            OverwritePolicy::Literal => self.write_literal(key, value),
        };

        // Only reachable at capacity zero, where the cache was empty and the
        // pre-write check had nothing to evict.
        if self.index.len() > self.capacity {
            debug_assert!(displaced.evicted.is_none());
            displaced.evicted = self.evict_lru();
        }

        displaced
    }

    /// Removes `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.index.remove(key)?;
        self.release(idx).map(|(_, v)| v)
    }

    /// The entry that the next eviction would remove.
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.slots
            .get(self.lru)?
            .entry
            .as_ref()
            .map(|(k, v)| (k, v))
    }

    /// Removes and returns the least-recently-used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let idx = self.lru_index()?;
        if let Some((key, _)) = &self.slots[idx].entry {
            self.index.remove(key);
        }
        self.release(idx)
    }

    /// Changes the capacity, evicting from the least-recently-used end until
    /// the cache fits. Evicted entries are returned oldest first.
    pub fn resize(&mut self, capacity: usize) -> Vec<(K, V)> {
        self.capacity = capacity;
        let mut evicted = Vec::new();
        while self.index.len() > capacity {
            match self.evict_lru() {
                Some(entry) => evicted.push(entry),
                None => break,
            }
        }
        tracing::debug!(capacity, evicted = evicted.len(), "cache resized");
        evicted
    }

    /// Drops every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.lru = NIL;
        self.mru = NIL;
    }

    /// Entries from least- to most-recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            cursor: self.lru,
            remaining: self.index.len(),
        }
    }

    /// Keys from least- to most-recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.index.len(),
            capacity: self.capacity,
            hits: self.counters.hits,
            misses: self.counters.misses,
            insertions: self.counters.insertions,
            updates: self.counters.updates,
            evictions: self.counters.evictions,
        }
    }

    /// Zeroes the hit, miss, insertion, update and eviction counters.
    pub fn reset_stats(&mut self) {
        self.counters = Counters::default();
    }

    fn write_refreshing(&mut self, key: K, value: V) -> Displaced<K, V> {
        if let Some(idx) = self.index.get(&key).copied() {
            let replaced = self.replace_value(idx, value);
            self.move_to_mru(idx);
            return Displaced {
                evicted: None,
                replaced,
            };
        }

        let evicted = self.evict_if_full();
        self.insert_new(key, value);
        Displaced {
            evicted,
            replaced: None,
        }
    }

    fn write_literal(&mut self, key: K, value: V) -> Displaced<K, V> {
        // The capacity check runs before looking at `key`, so an overwrite
        // at capacity evicts, possibly `key` itself.
        let evicted = self.evict_if_full();

        let replaced = match self.index.get(&key).copied() {
            Some(idx) => self.replace_value(idx, value),
            None => {
                self.insert_new(key, value);
                None
            }
        };
        Displaced { evicted, replaced }
    }

    fn evict_if_full(&mut self) -> Option<(K, V)> {
        if self.index.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        }
    }

    fn evict_lru(&mut self) -> Option<(K, V)> {
        let entry = self.pop_lru()?;
        self.counters.evictions += 1;
        tracing::trace!(
            capacity = self.capacity,
            len = self.index.len(),
            "evicted least-recently-used entry"
        );
        Some(entry)
    }

    fn replace_value(&mut self, idx: usize, value: V) -> Option<V> {
        self.counters.updates += 1;
        self.slots[idx]
            .entry
            .as_mut()
            .map(|(_, v)| std::mem::replace(v, value))
    }

    /// The index entry goes in first: hashing `key` is the only step that
    /// can panic, and it must do so before the arena or list changes.
    fn insert_new(&mut self, key: K, value: V) {
        let idx = self.free.last().copied().unwrap_or(self.slots.len());
        self.index.insert(key.clone(), idx);

        let slot = Slot {
            entry: Some((key, value)),
            prev: NIL,
            next: NIL,
        };
        if self.free.pop().is_some() {
            self.slots[idx] = slot;
        } else {
            self.slots.push(slot);
        }
        self.link_mru(idx);
        self.counters.insertions += 1;
    }

    fn lru_index(&self) -> Option<usize> {
        (self.lru != NIL).then_some(self.lru)
    }

    /// Unlinks a slot and returns it to the free list. The caller owns
    /// removing the key from `index`.
    fn release(&mut self, idx: usize) -> Option<(K, V)> {
        self.unlink(idx);
        self.free.push(idx);
        self.slots[idx].entry.take()
    }

    fn move_to_mru(&mut self, idx: usize) {
        if self.mru != idx {
            self.unlink(idx);
            self.link_mru(idx);
        }
    }

    fn link_mru(&mut self, idx: usize) {
        self.slots[idx].prev = self.mru;
        self.slots[idx].next = NIL;
        if self.mru == NIL {
            self.lru = idx;
        } else {
            self.slots[self.mru].next = idx;
        }
        self.mru = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        if prev == NIL {
            self.lru = next;
        } else {
            self.slots[prev].next = next;
        }
        if next == NIL {
            self.mru = prev;
        } else {
            self.slots[next].prev = prev;
        }
        self.slots[idx].prev = NIL;
        self.slots[idx].next = NIL;
    }
}

/// Iterator over cache entries from least- to most-recently used.
pub struct Iter<'a, K, V> {
    slots: &'a [Slot<K, V>],
    cursor: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.slots.get(self.cursor)?;
        self.cursor = slot.next;
        self.remaining = self.remaining.saturating_sub(1);
        slot.entry.as_ref().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K: Hash + Eq + Clone, V> IntoIterator for &'a RecencyCache<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
