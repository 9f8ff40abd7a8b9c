//! Fetch Cache Module
//!
//! Public cache façade combining the entry store, single-flight fetching and
//! size-based eviction.

use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::eviction;
use crate::cache::flight::{FetchCoordinator, FlightRole};
use crate::cache::{CacheStats, EntryStore, DEFAULT_CAPACITY, DEFAULT_EVICTION_TARGET};
use crate::config::Config;
use crate::error::{CacheError, ProducerError, Result};

/// State guarded by the structural lock.
struct CacheState<K, V> {
    store: EntryStore<K, V>,
    stats: CacheStats,
}

struct CacheInner<K, V> {
    state: Mutex<CacheState<K, V>>,
    flights: FetchCoordinator<K, V>,
    max_size: usize,
    eviction_target: usize,
}

// == Fetch Cache ==
/// A bounded, thread-safe cache that fetches missing values through a
/// caller-supplied producer.
///
/// # Features
/// - **Single-flight**: concurrent misses on one key run the producer once;
///   every caller sees the same value or the same failure.
/// - **Bounded**: once an insert pushes the size past `max_size`, the least
///   recently used entries are evicted down to `eviction_target`.
/// - **Explicit shrink**: [`FetchCache::expire_to`] trims to any size.
///
/// Cloning the handle is cheap; clones share the same entries.
///
/// # Example
/// ```
/// use fetch_cache::FetchCache;
///
/// let cache: FetchCache<u32, String> = FetchCache::new(5, 3).unwrap();
/// let value = cache
///     .get_or_fetch(7, |id| Ok::<_, std::io::Error>(format!("item-{}", id)))
///     .unwrap();
/// assert_eq!(value, "item-7");
/// assert_eq!(cache.size(), 1);
/// ```
pub struct FetchCache<K, V> {
    inner: Arc<CacheInner<K, V>>,
}

impl<K, V> Clone for FetchCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> FetchCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    // == Constructor ==
    /// Creates a cache holding at most `max_size` entries that trims to
    /// `eviction_target` entries when that capacity is exceeded.
    ///
    /// # Errors
    /// `CacheError::InvalidConfig` unless `0 < eviction_target <= max_size`.
    pub fn new(max_size: usize, eviction_target: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be greater than zero".to_string(),
            ));
        }
        if eviction_target == 0 {
            return Err(CacheError::InvalidConfig(
                "eviction target must be greater than zero".to_string(),
            ));
        }
        if eviction_target > max_size {
            return Err(CacheError::InvalidConfig(format!(
                "eviction target {} exceeds capacity {}",
                eviction_target, max_size
            )));
        }
        Ok(Self::build(max_size, eviction_target))
    }

    /// Creates a cache with the default capacity and eviction target.
    pub fn with_defaults() -> Self {
        Self::build(DEFAULT_CAPACITY, DEFAULT_EVICTION_TARGET)
    }

    /// Creates a cache sized from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.max_size, config.eviction_target)
    }

    fn build(max_size: usize, eviction_target: usize) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                state: Mutex::new(CacheState {
                    store: EntryStore::with_capacity(max_size.min(4096) + 1),
                    stats: CacheStats::new(),
                }),
                flights: FetchCoordinator::new(),
                max_size,
                eviction_target,
            }),
        }
    }

    // == Get Or Fetch ==
    /// Returns the cached value for `key`, fetching it with `producer` on a
    /// miss.
    ///
    /// If another caller is already fetching `key`, this call blocks until
    /// that fetch finishes and shares its outcome; `producer` is not called.
    ///
    /// # Errors
    /// `CacheError::UnfetchableItem` if the producer fails, both for the
    /// caller that ran it and for every caller waiting on it. Nothing is
    /// cached for the key, so a later call fetches again.
    pub fn get_or_fetch<F, E>(&self, key: K, producer: F) -> Result<V>
    where
        F: FnOnce(&K) -> std::result::Result<V, E>,
        E: Into<ProducerError>,
    {
        let role = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            if let Some(value) = state.store.touch(&key) {
                state.stats.record_hit();
                return Ok(value.clone());
            }
            state.stats.record_miss();

            // Claimed under the structural lock so a leader that is about to
            // insert cannot be raced into a second fetch.
            let role = self.inner.flights.claim(&key);
            match &role {
                FlightRole::Leader(_) => state.stats.record_fetch(),
                FlightRole::Follower(_) => state.stats.record_coalesced_wait(),
            }
            role
        };

        match role {
            FlightRole::Follower(pending) => pending.wait(),
            FlightRole::Leader(lease) => {
                debug!("Fetching item with key {:?}", key);
                let outcome = producer(&key).map_err(|err| CacheError::unfetchable(&key, err));
                match &outcome {
                    Ok(value) => {
                        self.insert_and_trim(key, value.clone());
                    }
                    Err(err) => {
                        warn!("{}", err);
                        self.inner.state.lock().stats.record_fetch_failure();
                    }
                }
                let waiters = lease.waiters();
                if waiters > 0 {
                    debug!(
                        "Releasing {} callers waiting on key {:?}",
                        waiters,
                        lease.key()
                    );
                }
                lease.complete(outcome)
            }
        }
    }

    // == Get ==
    /// Returns the cached value for `key` without fetching.
    ///
    /// A hit counts as an access for eviction purposes.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        match state.store.touch(key) {
            Some(value) => {
                state.stats.record_hit();
                Some(value.clone())
            }
            None => {
                state.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Inserts or replaces the value for `key` directly.
    ///
    /// Capacity is enforced exactly as for fetched values. Returns the value
    /// previously cached under `key`.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        self.insert_and_trim(key, value)
    }

    fn insert_and_trim(&self, key: K, value: V) -> Option<V> {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        let previous = state.store.insert(key, value);

        if state.store.len() > self.inner.max_size {
            let evicted = eviction::evict_to(&mut state.store, self.inner.eviction_target);
            info!(
                "Capacity {} exceeded, evicted {} items",
                self.inner.max_size,
                evicted.len()
            );
            state.stats.record_eviction_run(evicted.len());
        }
        state.stats.set_total_entries(state.store.len());
        previous
    }

    // == Expire To ==
    /// Evicts entries until at most `target_size` remain.
    ///
    /// Does nothing if the cache already holds `target_size` entries or fewer.
    pub fn expire_to(&self, target_size: usize) {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        if state.store.len() <= target_size {
            return;
        }

        let evicted = eviction::evict_to(&mut state.store, target_size);
        info!(
            "Expired {} items, cache trimmed to {}",
            evicted.len(),
            state.store.len()
        );
        state.stats.record_eviction_run(evicted.len());
        state.stats.set_total_entries(state.store.len());
    }

    // == Invalidate ==
    /// Removes the entries for the given keys.
    ///
    /// Returns how many of them were cached. Fetches already in flight for
    /// these keys are not affected.
    pub fn invalidate<'a, I>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        let mut removed = 0;
        for key in keys {
            if state.store.remove(key).is_some() {
                debug!("Invalidated item with key {:?}", key);
                removed += 1;
            }
        }
        state.stats.record_invalidations(removed);
        state.stats.set_total_entries(state.store.len());
        removed
    }

    // == Remove ==
    /// Removes the entry for `key`, returning its value.
    ///
    /// Does not count as a lookup. A fetch in flight for `key` is not
    /// affected.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        let removed = state.store.remove(key).map(|entry| entry.value);
        if removed.is_some() {
            debug!("Removed item with key {:?}", key);
            state.stats.record_invalidations(1);
            state.stats.set_total_entries(state.store.len());
        }
        removed
    }

    // == Clear ==
    /// Removes every entry. Returns the number removed.
    pub fn clear(&self) -> usize {
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        let removed = state.store.clear();
        state.stats.record_invalidations(removed);
        state.stats.set_total_entries(0);
        removed
    }

    // == Contains ==
    /// Returns true if `key` is cached. Does not count as an access.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.state.lock().store.contains_key(key)
    }

    // == Size ==
    /// Returns the current number of entries.
    pub fn size(&self) -> usize {
        self.inner.state.lock().store.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.inner.state.lock();
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.store.len());
        stats.in_flight = self.inner.flights.in_flight();
        stats
    }

    /// Time of the last eviction run, if any.
    pub fn last_eviction(&self) -> Option<DateTime<Utc>> {
        self.inner.state.lock().stats.last_eviction
    }

    /// Number of fetches currently running.
    pub fn in_flight(&self) -> usize {
        self.inner.flights.in_flight()
    }

    /// Maximum number of entries held after any insert.
    pub fn capacity(&self) -> usize {
        self.inner.max_size
    }

    /// Size the cache is trimmed to when capacity is exceeded.
    pub fn eviction_target(&self) -> usize {
        self.inner.eviction_target
    }
}

impl<K, V> Debug for FetchCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchCache")
            .field("max_size", &self.inner.max_size)
            .field("eviction_target", &self.inner.eviction_target)
            .field("size", &self.inner.state.lock().store.len())
            .finish()
    }
}
