//! Eviction Policy Module
//!
//! Least-recently-used victim selection over the entry store.

use std::hash::Hash;

use tracing::debug;

use crate::cache::{CacheEntry, EntryStore};

// == Eviction Rank ==
/// Ordering key for eviction; the smallest rank is evicted first.
///
/// Field order matters: least recent access first, then fewest accesses,
/// then oldest insertion.
///
/// Every insert and hit in one store draws a fresh sequence number, so
/// `last_access_seq` is unique per entry and decides the order on its own.
/// The other two fields keep the order total but never decide between live
/// entries, so the policy is plain LRU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct EvictionRank {
    pub(crate) last_access_seq: u64,
    pub(crate) access_count: u64,
    pub(crate) inserted_seq: u64,
}

impl EvictionRank {
    pub(crate) fn of<V>(entry: &CacheEntry<V>) -> Self {
        Self {
            last_access_seq: entry.last_access_seq,
            access_count: entry.access_count,
            inserted_seq: entry.inserted_seq,
        }
    }
}

// == Select Victims ==
/// Returns the keys that must go for the store to shrink to `target`,
/// in eviction order.
pub(crate) fn select_victims<K, V>(store: &EntryStore<K, V>, target: usize) -> Vec<K>
where
    K: Eq + Hash + Clone,
{
    let excess = store.len().saturating_sub(target);
    if excess == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(EvictionRank, &K)> = store
        .iter()
        .map(|(key, entry)| (EvictionRank::of(entry), key))
        .collect();

    // Only the `excess` smallest ranks matter; partition before sorting them.
    if excess < ranked.len() {
        ranked.select_nth_unstable_by_key(excess - 1, |(rank, _)| *rank);
        ranked.truncate(excess);
    }
    ranked.sort_unstable_by_key(|(rank, _)| *rank);

    ranked.into_iter().map(|(_, key)| key.clone()).collect()
}

// == Evict To ==
/// Removes entries until the store holds at most `target`.
///
/// Returns the evicted keys in eviction order.
pub(crate) fn evict_to<K, V>(store: &mut EntryStore<K, V>, target: usize) -> Vec<K>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    let victims = select_victims(store, target);
    for key in &victims {
        debug!("Evicting item with key {:?}", key);
        store.remove(key);
    }
    victims
}
