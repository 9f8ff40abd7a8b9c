//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with access metadata.

// == Cache Entry ==
/// Represents a single cache entry with value and access metadata.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<V> {
    /// The stored value
    pub(crate) value: V,
    /// Sequence number drawn when the entry was inserted
    pub(crate) inserted_seq: u64,
    /// Sequence number drawn on the most recent access
    pub(crate) last_access_seq: u64,
    /// Number of accesses, including the fetch that created the entry
    pub(crate) access_count: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry at sequence `seq`.
    ///
    /// The creating fetch counts as the first access.
    pub(crate) fn new(value: V, seq: u64) -> Self {
        Self {
            value,
            inserted_seq: seq,
            last_access_seq: seq,
            access_count: 1,
        }
    }

    // == Touch ==
    /// Records an access at sequence `seq`.
    pub(crate) fn touch(&mut self, seq: u64) {
        debug_assert!(seq > self.last_access_seq, "sequence must increase");
        self.last_access_seq = seq;
        self.access_count += 1;
    }
}
