//! Fetch Cache - A bounded in-memory cache with single-flight fetching
//!
//! Values are produced on a miss by a caller-supplied producer; concurrent
//! misses on one key share a single producer call, and the cache trims itself
//! to a target size once it grows past capacity.

pub mod cache;
pub mod config;
pub mod error;
pub mod managed;
pub mod query;
pub mod soak;
pub mod tasks;

pub use cache::{CacheStats, FetchCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use managed::ManagedMap;
pub use query::{count_cache, QueryError, QueryResultCache, QueryRunner};
pub use tasks::spawn_stats_reporter;
