// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake device driver for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{DeviceDriver, DriverError};
use crate::process::{ChildHandle, FakeChild, ProcessError};
use async_trait::async_trait;
use devlab_core::{DeviceId, DeviceKind, DeviceMetrics, DeviceOs, DeviceSpec, Orientation};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Recorded driver call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Discover,
    Boot { id: DeviceId },
    Shutdown { id: DeviceId },
    Restart { id: DeviceId },
    Erase { id: DeviceId },
    IsBooted { id: DeviceId },
    ReadMetrics { id: DeviceId },
    Install { id: DeviceId, app_path: String },
    Uninstall { id: DeviceId, bundle_id: String },
    Launch { id: DeviceId, bundle_id: String },
    GetOrientation { id: DeviceId },
    SetOrientation { id: DeviceId, target: Orientation },
    KeyEvent { id: DeviceId, code: u32 },
    LockScreen { id: DeviceId },
    PressHome { id: DeviceId },
    Shake { id: DeviceId },
    SetHardwareKeyboard { id: DeviceId, connected: bool },
    StartInstrument { id: DeviceId, template: String },
}

struct FakeDriverState {
    fleet: Vec<DeviceSpec>,
    booted: HashSet<DeviceId>,
    /// Per-device count of `is_booted` probes that report false after a
    /// boot, before the device comes up.
    polls_until_ready: HashMap<DeviceId, u32>,
    active_polls: HashMap<DeviceId, u32>,
    orientations: HashMap<DeviceId, Orientation>,
    metrics: HashMap<DeviceId, DeviceMetrics>,
    /// One-shot failures keyed by operation name.
    failures: HashMap<String, String>,
    calls: Vec<DriverCall>,
    discover_count: usize,
    discover_delay: Option<Duration>,
    boot_spawns_child: bool,
    children: Vec<Arc<FakeChild>>,
    next_pid: u32,
}

/// Scripted in-memory device fleet.
#[derive(Clone)]
pub struct FakeDriver {
    name: &'static str,
    os: DeviceOs,
    kind: DeviceKind,
    inner: Arc<Mutex<FakeDriverState>>,
}

impl FakeDriver {
    fn with_shape(name: &'static str, os: DeviceOs, kind: DeviceKind) -> Self {
        Self {
            name,
            os,
            kind,
            inner: Arc::new(Mutex::new(FakeDriverState {
                fleet: Vec::new(),
                booted: HashSet::new(),
                polls_until_ready: HashMap::new(),
                active_polls: HashMap::new(),
                orientations: HashMap::new(),
                metrics: HashMap::new(),
                failures: HashMap::new(),
                calls: Vec::new(),
                discover_count: 0,
                discover_delay: None,
                boot_spawns_child: false,
                children: Vec::new(),
                next_pid: 50_000,
            })),
        }
    }

    /// iOS-simulator-shaped fake: boot owns no child process.
    pub fn ios_simulator() -> Self {
        Self::with_shape("fake-ios-simulator", DeviceOs::Ios, DeviceKind::Simulator)
    }

    /// Android-emulator-shaped fake: boot hands back a child handle.
    pub fn android_emulator() -> Self {
        let driver =
            Self::with_shape("fake-android-emulator", DeviceOs::Android, DeviceKind::Simulator);
        driver.inner.lock().boot_spawns_child = true;
        driver
    }

    // ── Scripting ───────────────────────────────────────────────────────────

    pub fn add_device(&self, spec: DeviceSpec) {
        let mut inner = self.inner.lock();
        if spec.booted {
            inner.booted.insert(spec.id.clone());
        }
        if let Some(o) = spec.orientation {
            inner.orientations.insert(spec.id.clone(), o);
        }
        inner.fleet.push(spec);
    }

    /// Mark a device booted without going through `boot`.
    pub fn set_booted(&self, id: &DeviceId, booted: bool) {
        let mut inner = self.inner.lock();
        if booted {
            inner.booted.insert(id.clone());
        } else {
            inner.booted.remove(id);
        }
    }

    /// After `boot`, report not-booted for this many probes.
    pub fn set_polls_until_ready(&self, id: &DeviceId, polls: u32) {
        self.inner.lock().polls_until_ready.insert(id.clone(), polls);
    }

    pub fn set_metrics(&self, id: &DeviceId, metrics: DeviceMetrics) {
        self.inner.lock().metrics.insert(id.clone(), metrics);
    }

    pub fn set_orientation_value(&self, id: &DeviceId, o: Orientation) {
        self.inner.lock().orientations.insert(id.clone(), o);
    }

    /// Fail the next invocation of `op` ("boot", "launch", ...).
    pub fn fail_next(&self, op: &str, detail: &str) {
        self.inner.lock().failures.insert(op.to_string(), detail.to_string());
    }

    /// Stall each discovery walk, to widen single-flight windows in tests.
    pub fn set_discover_delay(&self, delay: Duration) {
        self.inner.lock().discover_delay = Some(delay);
    }

    // ── Inspection ──────────────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<DriverCall> {
        self.inner.lock().calls.clone()
    }

    pub fn discover_count(&self) -> usize {
        self.inner.lock().discover_count
    }

    pub fn is_marked_booted(&self, id: &DeviceId) -> bool {
        self.inner.lock().booted.contains(id)
    }

    /// Children handed out by boot and start_instrument, in order.
    pub fn children(&self) -> Vec<Arc<FakeChild>> {
        self.inner.lock().children.clone()
    }

    fn take_failure(&self, op: &'static str) -> Result<(), DriverError> {
        let detail = self.inner.lock().failures.remove(op);
        match detail {
            None => Ok(()),
            Some(detail) if op == "launch" => Err(DriverError::LaunchFailed { detail }),
            Some(detail) => Err(DriverError::Process(ProcessError::NonZeroExit {
                command: op.to_string(),
                exit_code: 1,
                stderr: detail,
            })),
        }
    }

    fn new_child(&self) -> Arc<FakeChild> {
        let mut inner = self.inner.lock();
        inner.next_pid += 1;
        let child = Arc::new(FakeChild::new(inner.next_pid));
        inner.children.push(Arc::clone(&child));
        child
    }

    fn record(&self, call: DriverCall) {
        self.inner.lock().calls.push(call);
    }
}

#[async_trait]
impl DeviceDriver for FakeDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn os(&self) -> DeviceOs {
        self.os
    }

    fn kind(&self) -> DeviceKind {
        self.kind
    }

    async fn discover(&self) -> Result<Vec<DeviceSpec>, DriverError> {
        self.record(DriverCall::Discover);
        let delay = self.inner.lock().discover_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.take_failure("discover")?;
        let mut inner = self.inner.lock();
        inner.discover_count += 1;
        let booted = inner.booted.clone();
        let orientations = inner.orientations.clone();
        Ok(inner
            .fleet
            .iter()
            .map(|spec| {
                let mut spec = spec.clone();
                spec.booted = booted.contains(&spec.id);
                spec.orientation = orientations.get(&spec.id).copied();
                spec
            })
            .collect())
    }

    async fn boot(&self, id: &DeviceId) -> Result<Option<Arc<dyn ChildHandle>>, DriverError> {
        self.record(DriverCall::Boot { id: id.clone() });
        self.take_failure("boot")?;
        let spawns_child = {
            let mut inner = self.inner.lock();
            let polls = inner.polls_until_ready.get(id).copied().unwrap_or(0);
            inner.active_polls.insert(id.clone(), polls);
            if polls == 0 {
                inner.booted.insert(id.clone());
            }
            inner.boot_spawns_child
        };
        if spawns_child {
            Ok(Some(self.new_child() as Arc<dyn ChildHandle>))
        } else {
            Ok(None)
        }
    }

    async fn shutdown(&self, id: &DeviceId) -> Result<(), DriverError> {
        self.record(DriverCall::Shutdown { id: id.clone() });
        self.take_failure("shutdown")?;
        let mut inner = self.inner.lock();
        inner.booted.remove(id);
        inner.active_polls.remove(id);
        Ok(())
    }

    async fn restart(&self, id: &DeviceId) -> Result<(), DriverError> {
        self.record(DriverCall::Restart { id: id.clone() });
        self.take_failure("restart")?;
        let mut inner = self.inner.lock();
        let polls = inner.polls_until_ready.get(id).copied().unwrap_or(0);
        inner.active_polls.insert(id.clone(), polls);
        if polls > 0 {
            inner.booted.remove(id);
        }
        Ok(())
    }

    async fn erase(&self, id: &DeviceId) -> Result<(), DriverError> {
        self.record(DriverCall::Erase { id: id.clone() });
        self.take_failure("erase")
    }

    async fn is_booted(&self, id: &DeviceId) -> Result<bool, DriverError> {
        self.record(DriverCall::IsBooted { id: id.clone() });
        self.take_failure("is-booted")?;
        let mut inner = self.inner.lock();
        if let Some(remaining) = inner.active_polls.get_mut(id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(false);
            }
            inner.active_polls.remove(id);
            inner.booted.insert(id.clone());
        }
        Ok(inner.booted.contains(id))
    }

    async fn read_metrics(&self, id: &DeviceId) -> Result<DeviceMetrics, DriverError> {
        self.record(DriverCall::ReadMetrics { id: id.clone() });
        self.take_failure("read-metrics")?;
        Ok(self
            .inner
            .lock()
            .metrics
            .get(id)
            .copied()
            .unwrap_or(DeviceMetrics { width: 750, height: 1334, density: 2 }))
    }

    async fn install(&self, id: &DeviceId, app_path: &str) -> Result<(), DriverError> {
        self.record(DriverCall::Install {
            id: id.clone(),
            app_path: app_path.to_string(),
        });
        self.take_failure("install")
    }

    async fn uninstall(&self, id: &DeviceId, bundle_id: &str) -> Result<(), DriverError> {
        self.record(DriverCall::Uninstall {
            id: id.clone(),
            bundle_id: bundle_id.to_string(),
        });
        self.take_failure("uninstall")
    }

    async fn launch(&self, id: &DeviceId, bundle_id: &str) -> Result<(), DriverError> {
        self.record(DriverCall::Launch {
            id: id.clone(),
            bundle_id: bundle_id.to_string(),
        });
        self.take_failure("launch")
    }

    async fn get_orientation(&self, id: &DeviceId) -> Result<Orientation, DriverError> {
        self.record(DriverCall::GetOrientation { id: id.clone() });
        self.take_failure("get-orientation")?;
        self.inner
            .lock()
            .orientations
            .get(id)
            .copied()
            .ok_or(DriverError::Unsupported { op: "get-orientation", driver: self.name })
    }

    async fn set_orientation(
        &self,
        id: &DeviceId,
        _current: Orientation,
        target: Orientation,
    ) -> Result<(), DriverError> {
        self.record(DriverCall::SetOrientation { id: id.clone(), target });
        self.take_failure("set-orientation")?;
        self.inner.lock().orientations.insert(id.clone(), target);
        Ok(())
    }

    async fn key_event(&self, id: &DeviceId, code: u32) -> Result<(), DriverError> {
        self.record(DriverCall::KeyEvent { id: id.clone(), code });
        self.take_failure("key-event")
    }

    async fn lock_screen(&self, id: &DeviceId) -> Result<(), DriverError> {
        self.record(DriverCall::LockScreen { id: id.clone() });
        self.take_failure("lock-screen")
    }

    async fn press_home(&self, id: &DeviceId) -> Result<(), DriverError> {
        self.record(DriverCall::PressHome { id: id.clone() });
        self.take_failure("press-home")
    }

    async fn shake(&self, id: &DeviceId) -> Result<(), DriverError> {
        self.record(DriverCall::Shake { id: id.clone() });
        self.take_failure("shake")
    }

    async fn set_hardware_keyboard(
        &self,
        id: &DeviceId,
        connected: bool,
    ) -> Result<(), DriverError> {
        self.record(DriverCall::SetHardwareKeyboard { id: id.clone(), connected });
        self.take_failure("set-hardware-keyboard")
    }

    async fn start_instrument(
        &self,
        id: &DeviceId,
        template: &str,
        _artifact_dir: &Path,
    ) -> Result<Arc<dyn ChildHandle>, DriverError> {
        self.record(DriverCall::StartInstrument {
            id: id.clone(),
            template: template.to_string(),
        });
        self.take_failure("start-instrument")?;
        Ok(self.new_child() as Arc<dyn ChildHandle>)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
