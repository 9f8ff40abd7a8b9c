//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, fetches, and evictions.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups served from an existing entry
    pub hits: u64,
    /// Lookups that found no entry
    pub misses: u64,
    /// Producer invocations
    pub fetches: u64,
    /// Producer invocations that failed
    pub fetch_failures: u64,
    /// Misses that waited on another caller's fetch instead of fetching
    pub coalesced_waits: u64,
    /// Entries removed by eviction (automatic or explicit)
    pub evictions: u64,
    /// Number of eviction runs that removed at least one entry
    pub eviction_runs: u64,
    /// Entries removed by key
    pub invalidations: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Fetches in flight when the snapshot was taken
    pub in_flight: usize,
    /// Time of the last eviction run
    pub last_eviction: Option<DateTime<Utc>>,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_fetch(&mut self) {
        self.fetches += 1;
    }

    pub fn record_fetch_failure(&mut self) {
        self.fetch_failures += 1;
    }

    pub fn record_coalesced_wait(&mut self) {
        self.coalesced_waits += 1;
    }

    // == Record Eviction Run ==
    /// Counts an eviction run that removed `count` entries.
    ///
    /// Runs that removed nothing are not recorded.
    pub fn record_eviction_run(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.evictions += count as u64;
        self.eviction_runs += 1;
        self.last_eviction = Some(Utc::now());
    }

    pub fn record_invalidations(&mut self, count: usize) {
        self.invalidations += count as u64;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
