// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovery coordinator: TTL caches + single-flight walks.
//!
//! One cache per driver kind. A request inside the TTL window is answered
//! from cache without a subprocess; concurrent requests past the TTL
//! coalesce into one walk whose snapshot every waiter shares.

use crate::singleflight::SingleFlight;
use crate::table::DeviceTable;
use devlab_adapters::{validate_spec, DeviceDriver};
use devlab_core::{Clock, DeviceKind, DeviceOs, DeviceSpec};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Failure shared by every waiter of one walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkFailure {
    pub driver: &'static str,
    pub detail: String,
}

/// Shared snapshot of one successful walk.
pub type WalkSnapshot = Arc<Vec<DeviceSpec>>;
type WalkResult = Result<WalkSnapshot, WalkFailure>;

/// Per-kind walk TTLs.
#[derive(Debug, Clone, Copy)]
pub struct WalkTtl {
    /// Listing walks (`simctl list`, `adb devices`).
    pub listing: Duration,
    /// AVD filesystem walks.
    pub avd: Duration,
}

impl Default for WalkTtl {
    fn default() -> Self {
        Self {
            listing: Duration::from_secs(1),
            avd: Duration::from_secs(3),
        }
    }
}

impl WalkTtl {
    /// Zeroed TTLs: every request walks. Useful in tests.
    pub fn none() -> Self {
        Self {
            listing: Duration::ZERO,
            avd: Duration::ZERO,
        }
    }

    fn for_driver(&self, driver: &Arc<dyn DeviceDriver>) -> Duration {
        // The Android emulator walk reads the AVD tree off disk; everything
        // else is a tool listing.
        if driver.os() == DeviceOs::Android && driver.kind() == DeviceKind::Simulator {
            self.avd
        } else {
            self.listing
        }
    }
}

struct KindCache {
    walked_at: Instant,
    snapshot: WalkSnapshot,
}

/// Coordinates walks across drivers and merges results into the table.
pub struct DiscoveryCoordinator<C: Clock> {
    clock: C,
    ttl: WalkTtl,
    caches: Mutex<HashMap<&'static str, KindCache>>,
    flights: SingleFlight<&'static str, WalkResult>,
}

impl<C: Clock> DiscoveryCoordinator<C> {
    pub fn new(clock: C, ttl: WalkTtl) -> Self {
        Self {
            clock,
            ttl,
            caches: Mutex::new(HashMap::new()),
            flights: SingleFlight::new(),
        }
    }

    /// Walk one driver's kind, honoring the TTL cache and the single-flight
    /// discipline, and merge the snapshot into the table.
    pub async fn walk(
        &self,
        driver: &Arc<dyn DeviceDriver>,
        table: &DeviceTable,
    ) -> Result<WalkSnapshot, WalkFailure> {
        let key = driver.name();
        let ttl = self.ttl.for_driver(driver);

        if let Some(snapshot) = self.fresh(key, ttl) {
            return Ok(snapshot);
        }

        self.flights
            .run(key, async {
                // A late leader may find the cache already refreshed by the
                // flight it queued behind; re-check before walking again.
                if let Some(snapshot) = self.fresh(key, ttl) {
                    return Ok(snapshot);
                }
                self.walk_now(driver, table).await
            })
            .await
    }

    fn fresh(&self, key: &'static str, ttl: Duration) -> Option<WalkSnapshot> {
        let caches = self.caches.lock();
        let cache = caches.get(key)?;
        (self.clock.now().saturating_duration_since(cache.walked_at) < ttl)
            .then(|| Arc::clone(&cache.snapshot))
    }

    async fn walk_now(
        &self,
        driver: &Arc<dyn DeviceDriver>,
        table: &DeviceTable,
    ) -> WalkResult {
        let walked_at = self.clock.now();
        let specs = driver.discover().await.map_err(|e| WalkFailure {
            driver: driver.name(),
            detail: e.to_string(),
        })?;

        // Capability check: half-described devices are dropped, not surfaced.
        let mut kept = Vec::with_capacity(specs.len());
        for spec in specs {
            match validate_spec(&spec) {
                Ok(()) => kept.push(spec),
                Err(reason) => {
                    tracing::warn!(driver = driver.name(), %reason, "dropping device from walk");
                }
            }
        }

        table.merge(&kept, driver).map_err(|e| WalkFailure {
            driver: driver.name(),
            detail: format!("merge failed: {e}"),
        })?;

        let snapshot: WalkSnapshot = Arc::new(kept);
        self.caches.lock().insert(
            driver.name(),
            KindCache {
                walked_at,
                snapshot: Arc::clone(&snapshot),
            },
        );
        Ok(snapshot)
    }

    /// Forget cached walks (the next request walks unconditionally).
    pub fn invalidate(&self) {
        self.caches.lock().clear();
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
