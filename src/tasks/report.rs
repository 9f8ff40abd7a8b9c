//! Stats Report Task
//!
//! Background task that periodically logs a cache statistics snapshot.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::FetchCache;

/// Spawns a background task that logs cache statistics every interval.
///
/// The task runs until aborted. Intervals with no new requests are logged at
/// debug level only. An interval of zero is raised to one second.
///
/// # Arguments
/// * `cache` - Handle to the cache being reported on
/// * `interval_secs` - Interval in seconds between reports
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache: FetchCache<String, String> = FetchCache::with_defaults();
/// let reporter = spawn_stats_reporter(cache.clone(), 5);
/// // Later, during shutdown:
/// reporter.abort();
/// ```
pub fn spawn_stats_reporter<K, V>(cache: FetchCache<K, V>, interval_secs: u64) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let interval = report_interval(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting stats reporter with interval of {} seconds",
            interval.as_secs()
        );

        let mut last_requests = 0;
        loop {
            tokio::time::sleep(interval).await;

            let stats = cache.stats();
            let requests = stats.hits + stats.misses;
            if requests == last_requests {
                debug!("Cache idle: {} entries", stats.total_entries);
                continue;
            }
            last_requests = requests;

            info!(
                entries = stats.total_entries,
                in_flight = stats.in_flight,
                hits = stats.hits,
                misses = stats.misses,
                fetch_failures = stats.fetch_failures,
                evictions = stats.evictions,
                "Cache hit rate {:.1}%",
                stats.hit_rate() * 100.0
            );
        }
    })
}

fn report_interval(interval_secs: u64) -> Duration {
    Duration::from_secs(interval_secs.max(1))
}
