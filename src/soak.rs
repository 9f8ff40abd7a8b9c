//! Soak Workload
//!
//! Drives a shared cache from several threads with a simulated slow producer
//! and summarizes what each worker observed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::cache::{CacheStats, FetchCache};
use crate::config::Config;

/// Number of keys every worker keeps coming back to.
const HOT_KEYS: usize = 16;

// == Soak Plan ==
/// Per-worker workload parameters.
#[derive(Debug, Clone)]
pub struct SoakPlan {
    pub requests: usize,
    pub key_space: usize,
    pub fetch_delay: Duration,
    pub failure_every: usize,
}

impl SoakPlan {
    pub fn from_config(config: &Config) -> Self {
        Self {
            requests: config.soak_requests,
            key_space: config.soak_key_space.max(1),
            fetch_delay: Duration::from_millis(config.soak_fetch_delay_ms),
            failure_every: config.soak_failure_every,
        }
    }

    /// Key id requested by `worker` on its `request`th call.
    ///
    /// A quarter of the requests go to a small hot set so that workers
    /// collide on in-flight fetches; the rest are scattered over the key space.
    pub fn key_id(&self, worker: usize, request: usize) -> usize {
        if request % 4 == 0 {
            return request / 4 % HOT_KEYS.min(self.key_space);
        }
        let mut x = ((worker as u64) << 32) | request as u64;
        x ^= x >> 33;
        x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
        x ^= x >> 33;
        (x % self.key_space as u64) as usize
    }

    fn should_fail(&self, id: usize) -> bool {
        self.failure_every > 0 && id % self.failure_every == 0
    }
}

// == Worker Report ==
/// What a single worker observed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkerReport {
    pub worker: usize,
    pub requests: u64,
    pub values: u64,
    pub failures: u64,
    /// Largest cache size seen right after one of this worker's calls
    pub max_observed_size: usize,
}

// == Run Worker ==
/// Issues the plan's requests against `cache`, stopping early once `stop` is
/// set.
pub fn run_worker(
    worker: usize,
    cache: &FetchCache<String, String>,
    plan: &SoakPlan,
    stop: &AtomicBool,
) -> WorkerReport {
    let mut report = WorkerReport {
        worker,
        ..WorkerReport::default()
    };

    for request in 0..plan.requests {
        if stop.load(Ordering::Relaxed) {
            debug!("Worker {} stopped after {} requests", worker, request);
            break;
        }

        let id = plan.key_id(worker, request);
        let outcome = cache.get_or_fetch(format!("item:{}", id), |key: &String| {
            if !plan.fetch_delay.is_zero() {
                thread::sleep(plan.fetch_delay);
            }
            if plan.should_fail(id) {
                return Err(format!("simulated failure for {}", key));
            }
            Ok(format!("value-for-{}", key))
        });

        report.requests += 1;
        match outcome {
            Ok(_) => report.values += 1,
            Err(err) => {
                debug!("Worker {}: {}", worker, err);
                report.failures += 1;
            }
        }
        report.max_observed_size = report.max_observed_size.max(cache.size());
    }

    report
}

// == Soak Report ==
/// Summary of a complete soak run.
#[derive(Debug, Clone, Serialize)]
pub struct SoakReport {
    pub capacity: usize,
    pub elapsed_ms: u64,
    pub max_observed_size: usize,
    pub stats: CacheStats,
    pub workers: Vec<WorkerReport>,
}

impl SoakReport {
    pub fn new(
        cache: &FetchCache<String, String>,
        workers: Vec<WorkerReport>,
        elapsed: Duration,
    ) -> Self {
        let max_observed_size = workers
            .iter()
            .map(|w| w.max_observed_size)
            .max()
            .unwrap_or(0);
        Self {
            capacity: cache.capacity(),
            elapsed_ms: elapsed.as_millis() as u64,
            max_observed_size,
            stats: cache.stats(),
            workers,
        }
    }

    /// True if no worker ever saw the cache above capacity.
    pub fn capacity_held(&self) -> bool {
        self.max_observed_size <= self.capacity
    }

    pub fn total_requests(&self) -> u64 {
        self.workers.iter().map(|w| w.requests).sum()
    }
}
