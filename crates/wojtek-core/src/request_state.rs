//! Per-resource request state machine.
//!
//! Speech playback (keyed by message index) and gallery generation (keyed by
//! slot) both allow at most one in-flight request per key.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

/// Lifecycle of a request tied to one resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    #[default]
    Idle,
    InFlight,
    Done,
    Failed,
}

impl RequestState {
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::InFlight)
    }
}

/// Tracks a [`RequestState`] for each key.
///
/// Cloning shares the underlying table.
#[derive(Debug)]
pub struct RequestGuard<K> {
    states: Arc<Mutex<HashMap<K, RequestState>>>,
}

impl<K> Clone for RequestGuard<K> {
    fn clone(&self) -> Self {
        Self {
            states: Arc::clone(&self.states),
        }
    }
}

impl<K> Default for RequestGuard<K> {
    fn default() -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K> RequestGuard<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `key` to `InFlight` unless it already is.
    ///
    /// Returns `None` when a request for `key` is in flight. The returned
    /// permit marks the key `Failed` on drop unless [`RequestPermit::complete`]
    /// was called.
    pub fn try_begin(&self, key: K) -> Option<RequestPermit<K>> {
        let mut states = self.lock();
        let state = states.entry(key.clone()).or_default();
        if state.is_in_flight() {
            return None;
        }
        *state = RequestState::InFlight;
        Some(RequestPermit {
            guard: self.clone(),
            key: Some(key),
        })
    }

    /// Current state of `key`; unknown keys are `Idle`.
    pub fn state(&self, key: &K) -> RequestState {
        self.lock().get(key).copied().unwrap_or_default()
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.state(key).is_in_flight()
    }

    /// Keys currently in flight.
    pub fn in_flight(&self) -> Vec<K> {
        self.lock()
            .iter()
            .filter(|(_, state)| state.is_in_flight())
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn finish(&self, key: K, state: RequestState) {
        self.lock().insert(key, state);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, RequestState>> {
        // A poisoned table still holds valid states.
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Exclusive right to run the request for one key.
#[derive(Debug)]
pub struct RequestPermit<K>
where
    K: Eq + Hash + Clone,
{
    guard: RequestGuard<K>,
    key: Option<K>,
}

impl<K> RequestPermit<K>
where
    K: Eq + Hash + Clone,
{
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    /// Marks the request `Done`.
    pub fn complete(mut self) {
        if let Some(key) = self.key.take() {
            self.guard.finish(key, RequestState::Done);
        }
    }

    /// Marks the request `Failed`.
    pub fn fail(mut self) {
        if let Some(key) = self.key.take() {
            self.guard.finish(key, RequestState::Failed);
        }
    }

    /// Marks the request `Done` or `Failed` depending on `result`.
    pub fn finish_with<T, E>(self, result: &Result<T, E>) {
        if result.is_ok() {
            self.complete();
        } else {
            self.fail();
        }
    }
}

impl<K> Drop for RequestPermit<K>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.guard.finish(key, RequestState::Failed);
        }
    }
}
