//! Capacity-bounded LRU cache.
//!
//! [`RecencyCache`] holds at most `capacity` entries and evicts the
//! least-recently-used one when a write would exceed it. Reads refresh
//! recency. [`SharedCache`] puts one cache behind a lock for callers that
//! need to share it.

mod recency;
mod shared;

pub use recency::{CacheStats, Displaced, Iter, RecencyCache};
pub use shared::SharedCache;
