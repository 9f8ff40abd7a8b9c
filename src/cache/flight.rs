//! Fetch Coordinator Module
//!
//! Single-flight fetching: the first caller to miss on a key leads the fetch,
//! later callers for the same key wait on the leader's outcome.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::error::{CacheError, Result};

#[derive(Debug)]
struct FlightState<V> {
    outcome: Option<Result<V>>,
    waiters: usize,
}

// == Pending Fetch ==
/// Outcome slot for one in-flight fetch, shared by the leader and followers.
#[derive(Debug)]
pub(crate) struct PendingFetch<V> {
    state: Mutex<FlightState<V>>,
    ready: Condvar,
}

impl<V: Clone> PendingFetch<V> {
    fn new() -> Self {
        Self {
            state: Mutex::new(FlightState {
                outcome: None,
                waiters: 0,
            }),
            ready: Condvar::new(),
        }
    }

    fn publish(&self, outcome: Result<V>) {
        {
            let mut state = self.state.lock();
            state.outcome = Some(outcome);
        }
        self.ready.notify_all();
    }

    // == Wait ==
    /// Blocks until the leader publishes, then returns a copy of its outcome.
    pub(crate) fn wait(&self) -> Result<V> {
        let mut state = self.state.lock();
        state.waiters += 1;
        loop {
            if let Some(outcome) = &state.outcome {
                let outcome = outcome.clone();
                state.waiters -= 1;
                return outcome;
            }
            self.ready.wait(&mut state);
        }
    }

    /// Number of followers currently blocked on this fetch.
    pub(crate) fn waiters(&self) -> usize {
        self.state.lock().waiters
    }
}

// == Flight Role ==
/// What a missing caller must do for its key.
pub(crate) enum FlightRole<'a, K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Run the producer and publish through the lease.
    Leader(FlightLease<'a, K, V>),
    /// Wait for the leader's outcome.
    Follower(Arc<PendingFetch<V>>),
}

// == Flight Lease ==
/// Held by the leader while its producer runs.
///
/// Dropping the lease without completing it (a panicking producer) publishes
/// an `UnfetchableItem` so followers are released.
pub(crate) struct FlightLease<'a, K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    coordinator: &'a FetchCoordinator<K, V>,
    key: K,
    slot: Arc<PendingFetch<V>>,
    published: bool,
}

impl<'a, K, V> FlightLease<'a, K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    /// Followers currently waiting on this fetch.
    pub(crate) fn waiters(&self) -> usize {
        self.slot.waiters()
    }

    // == Complete ==
    /// Publishes the outcome to every follower and clears the pending fetch.
    pub(crate) fn complete(mut self, outcome: Result<V>) -> Result<V> {
        self.coordinator.finish(&self.key, &self.slot, outcome.clone());
        self.published = true;
        outcome
    }
}

impl<'a, K, V> Drop for FlightLease<'a, K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    fn drop(&mut self) {
        if self.published {
            return;
        }
        warn!("Fetch for key {:?} abandoned before completion", self.key);
        let abandoned = CacheError::unfetchable(
            &self.key,
            "producer panicked before publishing a value",
        );
        self.coordinator.finish(&self.key, &self.slot, Err(abandoned));
    }
}

// == Fetch Coordinator ==
/// Registry of in-flight fetches keyed by cache key.
#[derive(Debug)]
pub(crate) struct FetchCoordinator<K, V> {
    pending: Mutex<HashMap<K, Arc<PendingFetch<V>>>>,
}

impl<K, V> FetchCoordinator<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    // == Constructor ==
    pub(crate) fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    // == Claim ==
    /// Registers a pending fetch for `key`, or joins the one already running.
    ///
    /// Callers must hold the cache's structural lock and have just observed a
    /// miss for `key`; otherwise a completing leader can be raced into a
    /// second fetch.
    pub(crate) fn claim(&self, key: &K) -> FlightRole<'_, K, V> {
        let mut pending = self.pending.lock();
        if let Some(existing) = pending.get(key) {
            debug!("Joining in-flight fetch for key {:?}", key);
            return FlightRole::Follower(Arc::clone(existing));
        }

        let slot = Arc::new(PendingFetch::new());
        pending.insert(key.clone(), Arc::clone(&slot));
        FlightRole::Leader(FlightLease {
            coordinator: self,
            key: key.clone(),
            slot,
            published: false,
        })
    }

    fn finish(&self, key: &K, slot: &Arc<PendingFetch<V>>, outcome: Result<V>) {
        {
            let mut pending = self.pending.lock();
            if pending.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
                pending.remove(key);
            }
        }
        slot.publish(outcome);
    }

    // == In Flight ==
    /// Number of keys with a fetch currently running.
    pub(crate) fn in_flight(&self) -> usize {
        self.pending.lock().len()
    }

    #[cfg(test)]
    fn is_in_flight(&self, key: &K) -> bool {
        self.pending.lock().contains_key(key)
    }
}
