// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time.
//!
//! Every TTL and deadline decision in the control plane goes through a
//! [`Clock`] so that expiry behavior can be tested without sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of time for TTL and deadline decisions.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic instant for elapsed-time measurements.
    fn now(&self) -> Instant;

    /// Milliseconds since the Unix epoch.
    fn epoch_ms(&self) -> u64;
}

/// Wall-clock implementation for production use.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Settable clock for tests.
///
/// `now()` is anchored at construction time and moves only via [`advance`].
/// `epoch_ms()` starts at zero and moves via [`set_epoch_ms`] and
/// [`advance`].
///
/// [`advance`]: FakeClock::advance
/// [`set_epoch_ms`]: FakeClock::set_epoch_ms
#[derive(Clone)]
pub struct FakeClock {
    base: Instant,
    offset_ms: Arc<AtomicU64>,
    epoch_ms: Arc<AtomicU64>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_ms: Arc::new(AtomicU64::new(0)),
            epoch_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Pin the epoch to an absolute millisecond timestamp.
    pub fn set_epoch_ms(&self, ms: u64) {
        self.epoch_ms.store(ms, Ordering::SeqCst);
    }

    /// Move both the monotonic and epoch clocks forward.
    pub fn advance(&self, d: Duration) {
        let ms = d.as_millis() as u64;
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
        self.epoch_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }

    fn epoch_ms(&self) -> u64 {
        self.epoch_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
