//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the capacity, eviction and statistics guarantees
//! over arbitrary operation sequences.

use proptest::prelude::*;
use std::collections::HashSet;
use std::io;

use crate::cache::FetchCache;

// == Test Configuration ==
const TEST_KEY_SPACE: u32 = 64;

// == Strategies ==
/// Generates a (max_size, eviction_target) pair with 0 < target <= max
fn sizing_strategy() -> impl Strategy<Value = (usize, usize)> {
    (1usize..32).prop_flat_map(|max| (Just(max), 1..=max))
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Fetch { key: u32 },
    FailingFetch { key: u32 },
    Get { key: u32 },
    Put { key: u32 },
    Invalidate { key: u32 },
    ExpireTo { target: usize },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        6 => (0..TEST_KEY_SPACE).prop_map(|key| CacheOp::Fetch { key }),
        1 => (0..TEST_KEY_SPACE).prop_map(|key| CacheOp::FailingFetch { key }),
        2 => (0..TEST_KEY_SPACE).prop_map(|key| CacheOp::Get { key }),
        1 => (0..TEST_KEY_SPACE).prop_map(|key| CacheOp::Put { key }),
        1 => (0..TEST_KEY_SPACE).prop_map(|key| CacheOp::Invalidate { key }),
        1 => (0usize..40).prop_map(|target| CacheOp::ExpireTo { target }),
    ]
}

fn value_for(key: &u32) -> std::result::Result<String, io::Error> {
    Ok(format!("value-{}", key))
}

fn broken(_: &u32) -> std::result::Result<String, io::Error> {
    Err(io::Error::new(io::ErrorKind::Other, "backend down"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Capacity Enforcement
    // For any sequence of operations the cache never holds more than
    // max_size entries once an operation has returned.
    #[test]
    fn prop_capacity_enforcement(
        (max_size, target) in sizing_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..200)
    ) {
        let cache: FetchCache<u32, String> = FetchCache::new(max_size, target).unwrap();

        for op in ops {
            match op {
                CacheOp::Fetch { key } => {
                    let value = cache.get_or_fetch(key, value_for).unwrap();
                    prop_assert_eq!(value, format!("value-{}", key));
                }
                CacheOp::FailingFetch { key } => {
                    let _ = cache.get_or_fetch(key, broken);
                }
                CacheOp::Get { key } => {
                    let _ = cache.get(&key);
                }
                CacheOp::Put { key } => {
                    cache.put(key, format!("value-{}", key));
                }
                CacheOp::Invalidate { key } => {
                    cache.invalidate([&key]);
                }
                CacheOp::ExpireTo { target } => {
                    cache.expire_to(target);
                }
            }
            prop_assert!(
                cache.size() <= max_size,
                "Cache size {} exceeds max {}",
                cache.size(),
                max_size
            );
        }
    }

    // Eviction Trims To Target
    // An insert that pushes the size past max_size leaves exactly
    // eviction_target entries, and the newest key is always kept.
    #[test]
    fn prop_overflow_trims_to_target(
        (max_size, target) in sizing_strategy(),
        keys in prop::collection::vec(0..TEST_KEY_SPACE, 1..150)
    ) {
        let cache: FetchCache<u32, String> = FetchCache::new(max_size, target).unwrap();

        for key in keys {
            let was_cached = cache.contains_key(&key);
            let before = cache.size();
            cache.get_or_fetch(key, value_for).unwrap();

            if !was_cached && before == max_size {
                prop_assert_eq!(cache.size(), target);
            }
            prop_assert!(cache.contains_key(&key), "Key {} missing after fetch", key);
        }
    }

    // Explicit Shrink
    // expire_to(n) leaves min(size, n) entries and only removes entries.
    #[test]
    fn prop_expire_to_shrinks(
        keys in prop::collection::vec(0..TEST_KEY_SPACE, 1..100),
        shrink_to in 0usize..80
    ) {
        let cache: FetchCache<u32, String> = FetchCache::new(100, 50).unwrap();
        for key in &keys {
            cache.get_or_fetch(*key, value_for).unwrap();
        }

        let before: HashSet<u32> = keys
            .iter()
            .copied()
            .filter(|key| cache.contains_key(key))
            .collect();
        cache.expire_to(shrink_to);

        prop_assert_eq!(cache.size(), before.len().min(shrink_to));
        for key in 0..TEST_KEY_SPACE {
            if cache.contains_key(&key) {
                prop_assert!(before.contains(&key), "Key {} appeared from nowhere", key);
            }
        }
    }

    // Failed Fetch Leaves No Trace
    // A failing producer never adds an entry and never leaves a fetch
    // registered as in flight.
    #[test]
    fn prop_failed_fetch_leaves_no_entry(
        keys in prop::collection::vec(0..TEST_KEY_SPACE, 1..50),
        failing_key in TEST_KEY_SPACE..(TEST_KEY_SPACE * 2)
    ) {
        let cache: FetchCache<u32, String> = FetchCache::new(200, 100).unwrap();
        for key in &keys {
            cache.get_or_fetch(*key, value_for).unwrap();
        }
        let size = cache.size();

        let err = cache.get_or_fetch(failing_key, broken).unwrap_err();
        prop_assert!(err.is_unfetchable());
        prop_assert_eq!(cache.size(), size);
        prop_assert!(!cache.contains_key(&failing_key));
        prop_assert_eq!(cache.in_flight(), 0);
    }

    // Statistics Accuracy
    // For any sequence of lookups the hit and miss counters match what the
    // callers observed.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..100)) {
        let cache: FetchCache<u32, String> = FetchCache::new(16, 8).unwrap();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;
        let mut expected_failures: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Fetch { key } | CacheOp::FailingFetch { key } => {
                    let mut produced = false;
                    let failing = matches!(op, CacheOp::FailingFetch { .. });
                    let outcome = cache.get_or_fetch(key, |k| {
                        produced = true;
                        if failing { broken(k) } else { value_for(k) }
                    });
                    if produced {
                        expected_misses += 1;
                        if outcome.is_err() {
                            expected_failures += 1;
                        }
                    } else {
                        expected_hits += 1;
                    }
                }
                CacheOp::Get { key } => match cache.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Put { key } => {
                    cache.put(key, format!("value-{}", key));
                }
                CacheOp::Invalidate { key } => {
                    cache.invalidate([&key]);
                }
                CacheOp::ExpireTo { target } => {
                    cache.expire_to(target);
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.fetch_failures, expected_failures, "Failures mismatch");
        prop_assert_eq!(stats.total_entries, cache.size(), "Total entries mismatch");
        prop_assert_eq!(stats.in_flight, 0);
    }
}

// Property tests for eviction order
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Least Recently Used Goes First
    // With distinct keys filling the cache, the next insert evicts the
    // oldest entries and keeps the most recent eviction_target - 1 of them.
    #[test]
    fn prop_lru_eviction_order(
        (max_size, target) in sizing_strategy(),
        new_key in TEST_KEY_SPACE..(TEST_KEY_SPACE * 2)
    ) {
        let cache: FetchCache<u32, String> = FetchCache::new(max_size, target).unwrap();
        let keys: Vec<u32> = (0..max_size as u32).collect();
        for key in &keys {
            cache.get_or_fetch(*key, value_for).unwrap();
        }

        cache.get_or_fetch(new_key, value_for).unwrap();

        let survivors = target - 1;
        let cutoff = keys.len() - survivors;
        for (i, key) in keys.iter().enumerate() {
            prop_assert_eq!(
                cache.contains_key(key),
                i >= cutoff,
                "Unexpected residency for key {}",
                key
            );
        }
        prop_assert!(cache.contains_key(&new_key));
    }

    // Access Tracking
    // A hit on the oldest entry moves it out of the next eviction.
    #[test]
    fn prop_lru_access_tracking(max_size in 3usize..20) {
        let cache: FetchCache<u32, String> = FetchCache::new(max_size, max_size).unwrap();
        for key in 0..max_size as u32 {
            cache.get_or_fetch(key, value_for).unwrap();
        }

        prop_assert!(cache.get(&0).is_some());
        cache.get_or_fetch(1000, value_for).unwrap();

        prop_assert!(cache.contains_key(&0), "Touched key should survive");
        prop_assert!(!cache.contains_key(&1), "Oldest untouched key should be evicted");
        prop_assert_eq!(cache.size(), max_size);
    }
}
