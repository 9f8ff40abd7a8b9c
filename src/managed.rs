//! Managed Map
//!
//! A size-managed map whose entries are added explicitly rather than fetched.

use std::fmt::Debug;
use std::hash::Hash;

use crate::cache::{CacheStats, FetchCache};
use crate::error::{CacheError, Result};

// == Managed Map ==
/// Map-like wrapper over [`FetchCache`] with explicit inserts.
///
/// Entries are trimmed with the cache's capacity and eviction target, so a
/// value inserted earlier may be gone on a later lookup.
#[derive(Debug)]
pub struct ManagedMap<K, V> {
    cache: FetchCache<K, V>,
}

impl<K, V> ManagedMap<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Creates a map with the default capacity and eviction target.
    pub fn new() -> Self {
        Self::from_cache(FetchCache::with_defaults())
    }

    /// Creates a map with custom trimming characteristics.
    pub fn with_capacity(capacity: usize, eviction_target: usize) -> Result<Self> {
        Ok(Self::from_cache(FetchCache::new(capacity, eviction_target)?))
    }

    fn from_cache(cache: FetchCache<K, V>) -> Self {
        Self { cache }
    }

    /// Inserts a value, returning the one it replaced.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.cache.put(key, value)
    }

    /// Inserts every pair in order, trimming as each one lands.
    pub fn extend<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.cache.put(key, value);
        }
    }

    /// Returns the value for `key`; a hit counts as an access.
    pub fn get(&self, key: &K) -> Option<V> {
        self.cache.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.cache.contains_key(key)
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.cache.remove(key)
    }

    /// Like [`ManagedMap::remove`], but a missing key is an error.
    pub fn take(&self, key: &K) -> Result<V> {
        self.remove(key)
            .ok_or_else(|| CacheError::NotFound(format!("{:?}", key)))
    }

    pub fn len(&self) -> usize {
        self.cache.size()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl<K, V> Default for ManagedMap<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let map: ManagedMap<String, u32> = ManagedMap::new();

        assert_eq!(map.insert("a".to_string(), 1), None);
        assert_eq!(map.insert("a".to_string(), 2), Some(1));
        assert_eq!(map.get(&"a".to_string()), Some(2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_missing_key_creates_no_entry() {
        let map: ManagedMap<String, u32> = ManagedMap::new();

        assert_eq!(map.get(&"missing".to_string()), None);
        assert!(!map.contains_key(&"missing".to_string()));
        assert!(map.is_empty());
        assert_eq!(map.stats().fetches, 0);
    }

    #[test]
    fn test_remove_and_take() {
        let map: ManagedMap<&str, u32> = ManagedMap::new();
        map.insert("a", 1);
        map.insert("b", 2);

        assert_eq!(map.remove(&"a"), Some(1));
        assert_eq!(map.remove(&"a"), None);
        assert_eq!(map.take(&"b").unwrap(), 2);
        assert!(matches!(map.take(&"b"), Err(CacheError::NotFound(_))));
        assert!(map.is_empty());
    }

    #[test]
    fn test_remove_records_no_lookups() {
        let map: ManagedMap<u32, u32> = ManagedMap::new();
        map.insert(1, 10);

        assert_eq!(map.remove(&1), Some(10));
        assert_eq!(map.remove(&2), None);

        let stats = map.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.invalidations, 1);
    }

    #[test]
    fn test_extend() {
        let map = ManagedMap::with_capacity(3, 2).unwrap();
        map.extend((1..=3u32).map(|i| (i, i * 100)));
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&2), Some(200));

        // Fourth entry overflows; the two most recent survive
        map.extend(vec![(4, 400)]);
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(&2));
        assert!(map.contains_key(&4));
    }

    #[test]
    fn test_trims_like_cache() {
        let map = ManagedMap::with_capacity(3, 1).unwrap();
        for i in 0..4u32 {
            map.insert(i, i * 10);
        }

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&3), Some(30));
        assert_eq!(map.get(&0), None);
    }

    #[test]
    fn test_with_capacity_rejects_bad_sizes() {
        assert!(ManagedMap::<u32, u32>::with_capacity(2, 3).is_err());
    }

    #[test]
    fn test_clear() {
        let map: ManagedMap<u32, u32> = ManagedMap::new();
        map.insert(1, 1);
        map.insert(2, 2);

        map.clear();
        assert!(map.is_empty());
    }
}
