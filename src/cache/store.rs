//! Entry Store Module
//!
//! Key to entry mapping plus the sequence counter that orders every access.
//! The store has no locking of its own; the cache façade owns it behind the
//! structural lock.

use std::collections::HashMap;
use std::hash::Hash;

use crate::cache::CacheEntry;

// == Entry Store ==
/// In-memory mapping from key to entry metadata.
#[derive(Debug)]
pub(crate) struct EntryStore<K, V> {
    /// Key to entry storage
    entries: HashMap<K, CacheEntry<V>>,
    /// Last sequence number handed out
    seq: u64,
}

impl<K, V> EntryStore<K, V> {
    // == Length ==
    /// Returns the current number of entries in the store.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn current_seq(&self) -> u64 {
        self.seq
    }
}

impl<K, V> EntryStore<K, V>
where
    K: Eq + Hash,
{
    // == Constructor ==
    /// Creates an empty store sized for `capacity` entries.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            seq: 0,
        }
    }

    // == Sequence ==
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    // == Touch ==
    /// Looks up a key and records an access on a hit.
    ///
    /// Returns None without drawing a sequence number if the key is absent.
    pub(crate) fn touch(&mut self, key: &K) -> Option<&V> {
        if !self.entries.contains_key(key) {
            return None;
        }
        let seq = self.next_seq();
        let entry = self.entries.get_mut(key)?;
        entry.touch(seq);
        Some(&entry.value)
    }

    /// Returns the entry for a key without recording an access.
    #[cfg(test)]
    pub(crate) fn peek(&self, key: &K) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    // == Contains ==
    pub(crate) fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    // == Insert ==
    /// Stores a value under a fresh sequence number.
    ///
    /// An existing entry for the key is replaced, metadata included, and its
    /// value returned.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        let seq = self.next_seq();
        self.entries
            .insert(key, CacheEntry::new(value, seq))
            .map(|old| old.value)
    }

    // == Remove ==
    /// Removes an entry by key.
    pub(crate) fn remove(&mut self, key: &K) -> Option<CacheEntry<V>> {
        self.entries.remove(key)
    }

    // == Clear ==
    /// Removes every entry. The sequence counter keeps running.
    pub(crate) fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    // == Iterate ==
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &CacheEntry<V>)> {
        self.entries.iter()
    }
}
