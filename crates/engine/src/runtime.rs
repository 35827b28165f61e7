// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime: the composition root of the control plane.
//!
//! One `Runtime` value owns the drivers, the device table, the discovery
//! coordinator, and the session registry. There is no module-level state;
//! tests build a fresh runtime around fakes.

use crate::config::Config;
use crate::discovery::{DiscoveryCoordinator, WalkTtl};
use crate::drivers::load_drivers;
use crate::error::ControlError;
use crate::lifecycle::Device;
use crate::lockfile::DeviceLock;
use crate::sessions::SessionRegistry;
use crate::table::{DeviceCell, DeviceTable};
use devlab_adapters::{DeviceDriver, SystemProcessRunner};
use devlab_core::{
    Clock, DeviceEvent, DeviceId, DeviceStorage, SaltedTokenGen, SystemClock, TokenGen,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Runtime dependencies, injected for testability.
pub struct RuntimeDeps<C: Clock, G: TokenGen> {
    pub clock: C,
    pub tokens: G,
    pub storage: DeviceStorage,
    pub walk_ttl: WalkTtl,
}

/// The device control plane.
pub struct Runtime<C: Clock, G: TokenGen> {
    drivers: Vec<Arc<dyn DeviceDriver>>,
    table: Arc<DeviceTable>,
    discovery: Arc<DiscoveryCoordinator<C>>,
    sessions: SessionRegistry<C, G>,
    booting: Arc<Mutex<HashSet<DeviceId>>>,
    events: broadcast::Sender<DeviceEvent>,
}

impl<C: Clock, G: TokenGen> std::fmt::Debug for Runtime<C, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("drivers", &self.drivers.len())
            .finish()
    }
}

/// Production runtime over the system clock and salted tokens.
pub type SystemRuntime = Runtime<SystemClock, SaltedTokenGen>;

impl SystemRuntime {
    /// Build the production runtime from configuration.
    ///
    /// Fails with [`ControlError::DriverInvalid`] when the configuration
    /// names an unknown driver; embedders are expected to exit non-zero on
    /// that.
    pub fn from_config(config: &Config) -> Result<Self, ControlError> {
        let drivers = load_drivers(&config.drivers, SystemProcessRunner::new())?;
        Ok(Self::new(
            drivers,
            RuntimeDeps {
                clock: SystemClock,
                tokens: SaltedTokenGen::new(),
                storage: DeviceStorage::resolve(),
                walk_ttl: WalkTtl::default(),
            },
            config.device_session_timeout,
        ))
    }
}

impl<C: Clock, G: TokenGen> Runtime<C, G> {
    /// Build a runtime over explicit drivers and dependencies.
    pub fn new(
        drivers: Vec<Arc<dyn DeviceDriver>>,
        deps: RuntimeDeps<C, G>,
        session_ttl_ms: u64,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            drivers,
            table: Arc::new(DeviceTable::new(deps.storage)),
            discovery: Arc::new(DiscoveryCoordinator::new(deps.clock.clone(), deps.walk_ttl)),
            sessions: SessionRegistry::new(deps.clock, deps.tokens, session_ttl_ms),
            booting: Arc::new(Mutex::new(HashSet::new())),
            events,
        }
    }

    /// Walk every driver and return the merged fleet.
    ///
    /// Walks run concurrently; each honors its kind's TTL cache and the
    /// single-flight discipline. With `only_available`, devices with a live
    /// session or a foreign lock are filtered out; `list_only` skips the
    /// per-device lock-file probes and filters on sessions alone.
    pub async fn discover(
        &self,
        only_available: bool,
        list_only: bool,
    ) -> Result<Vec<Device<C, G>>, ControlError> {
        let mut walks = JoinSet::new();
        for driver in &self.drivers {
            let driver = Arc::clone(driver);
            let discovery = Arc::clone(&self.discovery);
            let table = Arc::clone(&self.table);
            walks.spawn(async move { discovery.walk(&driver, &table).await });
        }
        while let Some(joined) = walks.join_next().await {
            match joined {
                Ok(Ok(_)) => {}
                Ok(Err(failure)) => return Err(failure.into()),
                Err(e) => {
                    return Err(ControlError::DiscoveryFailed {
                        driver: "join",
                        detail: e.to_string(),
                    })
                }
            }
        }

        let mut devices: Vec<Device<C, G>> = self
            .table
            .all()
            .into_iter()
            .map(|cell| self.device(cell))
            .collect();
        devices.sort_by(|a, b| a.id().as_str().cmp(b.id().as_str()));

        if only_available {
            if list_only {
                devices.retain(|d| self.sessions.session_for_device(d.id()).is_none());
            } else {
                devices.retain(|d| match d.is_available() {
                    Ok(available) => available,
                    Err(e) => {
                        tracing::warn!(device = %d.id().short(12), error = %e,
                            "availability probe failed");
                        false
                    }
                });
            }
        }
        Ok(devices)
    }

    /// Devices whose display name matches, case-insensitively.
    pub fn get_devices_with_name(&self, name: &str) -> Vec<Device<C, G>> {
        self.table
            .by_name(name)
            .into_iter()
            .map(|cell| self.device(cell))
            .collect()
    }

    pub fn get_device_with_id(&self, id: &DeviceId) -> Option<Device<C, G>> {
        self.table.get(id).map(|cell| self.device(cell))
    }

    /// Subscribe to device events (instrument terminations).
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }

    /// Forget cached walks; the next discover reconciles from scratch.
    pub fn invalidate_discovery(&self) {
        self.discovery.invalidate();
    }

    pub fn sessions(&self) -> &SessionRegistry<C, G> {
        &self.sessions
    }

    fn device(&self, cell: Arc<DeviceCell>) -> Device<C, G> {
        let id = cell.record.lock().id.clone();
        let lock = DeviceLock::new(self.table.storage().lock_path(&id));
        Device::new(
            cell,
            self.sessions.clone(),
            lock,
            Arc::clone(&self.booting),
            self.events.clone(),
        )
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
