//! # recency-cache
//!
//! A capacity-bounded key→value cache with least-recently-used eviction.
//!
//! ```
//! use recency_cache::RecencyCache;
//!
//! let mut cache = RecencyCache::new(2);
//! cache.put(1, "a");
//! cache.put(2, "b");
//! assert_eq!(cache.get(&1), Some(&"a"));
//!
//! cache.put(3, "c"); // evicts 2, since 1 was just read
//! assert_eq!(cache.get(&2), None);
//! assert_eq!(cache.get(&3), Some(&"c"));
//! ```
//!
//! ## Modules
//!
//! - [`cache`] - The LRU cache and its shared handle
//! - [`replay`] - Operation scripts for driving a cache from text
//! - [`cli`] - Command-line interface
//! - [`types`] - Configuration and errors

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod replay;
pub mod types;

pub use cache::{CacheStats, Displaced, RecencyCache, SharedCache};
pub use types::config::{CacheConfig, Config, OverwritePolicy};
pub use types::errors::{CacheError, CacheResult};
