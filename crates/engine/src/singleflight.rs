// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keyed single-flight coordination.
//!
//! At most one operation per key runs at a time; callers arriving while one
//! is in flight wait for it and receive a clone of the same result.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::oneshot;

type WaiterMap<K, T> = Arc<Mutex<HashMap<K, Vec<oneshot::Sender<T>>>>>;

/// Coalesces concurrent operations by key.
pub struct SingleFlight<K, T> {
    waiters: WaiterMap<K, T>,
}

impl<K, T> Default for SingleFlight<K, T> {
    fn default() -> Self {
        Self {
            waiters: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Removes the flight entry when the leader is dropped mid-run, so queued
/// waiters observe the abandonment instead of hanging.
struct FlightGuard<K: Eq + Hash + Clone, T> {
    waiters: WaiterMap<K, T>,
    key: Option<K>,
}

impl<K: Eq + Hash + Clone, T> FlightGuard<K, T> {
    fn resolve(mut self) -> Vec<oneshot::Sender<T>> {
        match self.key.take() {
            Some(key) => self.waiters.lock().remove(&key).unwrap_or_default(),
            None => Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, T> Drop for FlightGuard<K, T> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.waiters.lock().remove(&key);
        }
    }
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` under the key, or wait for the in-flight run.
    ///
    /// The caller that finds no entry becomes the leader, runs the future,
    /// and fans its result out to everyone who queued meanwhile. Waiters
    /// never run `work`. A leader cancelled mid-flight wakes its waiters,
    /// and the first of them retakes the flight.
    pub async fn run<F>(&self, key: K, work: F) -> T
    where
        F: Future<Output = T>,
    {
        // One check-and-insert; leader vs waiter is decided atomically.
        let receiver = {
            let mut waiters = self.waiters.lock();
            match waiters.get_mut(&key) {
                Some(queue) => {
                    let (tx, rx) = oneshot::channel();
                    queue.push(tx);
                    Some(rx)
                }
                None => {
                    waiters.insert(key.clone(), Vec::new());
                    None
                }
            }
        };

        if let Some(rx) = receiver {
            if let Ok(result) = rx.await {
                return result;
            }
            // Leader abandoned the flight; retake it.
            return Box::pin(self.run(key, work)).await;
        }

        let guard = FlightGuard {
            waiters: Arc::clone(&self.waiters),
            key: Some(key),
        };
        let result = work.await;
        for tx in guard.resolve() {
            let _ = tx.send(result.clone());
        }
        result
    }

    /// Number of keys currently in flight.
    pub fn in_flight(&self) -> usize {
        self.waiters.lock().len()
    }
}

#[cfg(test)]
#[path = "singleflight_tests.rs"]
mod tests;
