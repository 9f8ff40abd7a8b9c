//! Cache Module
//!
//! Provides a bounded in-memory cache with single-flight fetching and
//! least-recently-used eviction.

mod entry;
mod eviction;
mod fetch_cache;
mod flight;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use fetch_cache::FetchCache;
pub use stats::CacheStats;

pub(crate) use entry::CacheEntry;
pub(crate) use store::EntryStore;

// == Public Constants ==
/// Default maximum number of entries
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default size the cache is trimmed to once capacity is exceeded
pub const DEFAULT_EVICTION_TARGET: usize = 300;
