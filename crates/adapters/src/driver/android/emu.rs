// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Android emulator driver: the AVD tree names the fleet, `emulator` boots
//! it, `adb` drives it.

use super::adb::{self, AdbRow};
use super::avd::{avd_home, scan_avds, AvdInfo};
use crate::driver::{DeviceDriver, DriverError};
use crate::process::{ChildHandle, ProcessRunner};
use crate::subprocess::ADB_TIMEOUT;
use async_trait::async_trait;
use devlab_core::{DeviceId, DeviceKind, DeviceMetrics, DeviceOs, DeviceSpec, Orientation};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DRIVER_NAME: &str = "android-emulator";

/// Controls Android emulators (AVDs).
#[derive(Clone)]
pub struct AndroidEmulatorDriver<R: ProcessRunner> {
    runner: R,
    avd_home: PathBuf,
}

impl<R: ProcessRunner> AndroidEmulatorDriver<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            avd_home: avd_home(),
        }
    }

    /// Use an explicit AVD home (tests point this at a tempdir).
    pub fn with_avd_home(runner: R, avd_home: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            avd_home: avd_home.into(),
        }
    }

    /// Ask a running emulator which AVD it hosts via the console.
    ///
    /// Output is the AVD name on the first line followed by "OK"; anything
    /// else means the console did not answer.
    async fn avd_name_for(&self, serial: &str) -> Option<String> {
        let argv = adb::adb_argv(serial, &["emu", "avd", "name"]);
        let out = self.runner.run(&argv, &[], ADB_TIMEOUT).await.ok()?;
        if !out.success() {
            return None;
        }
        let name = out.stdout.lines().next()?.trim();
        if name.is_empty() || name == "OK" {
            return None;
        }
        Some(name.to_string())
    }

    /// Serial of the running emulator hosting this AVD, if any.
    async fn serial_for(&self, id: &DeviceId) -> Result<Option<String>, DriverError> {
        let rows = adb::devices(&self.runner).await?;
        for row in rows.iter().filter(|r| r.is_emulator() && r.is_ready()) {
            if self.avd_name_for(&row.serial).await.as_deref() == Some(id.as_str()) {
                return Ok(Some(row.serial.clone()));
            }
        }
        Ok(None)
    }

    async fn require_serial(&self, id: &DeviceId) -> Result<String, DriverError> {
        self.serial_for(id)
            .await?
            .ok_or_else(|| DriverError::UnknownDevice(id.clone()))
    }

    /// A ready emulator row that answers with no AVD name is an orphan:
    /// nothing can address it, so its console is told to quit.
    async fn reap_orphan(&self, row: &AdbRow) {
        tracing::warn!(serial = %row.serial, "reaping orphaned emulator");
        let argv = adb::adb_argv(&row.serial, &["emu", "kill"]);
        if let Err(e) = self.runner.run(&argv, &[], ADB_TIMEOUT).await {
            tracing::warn!(serial = %row.serial, error = %e, "orphan reap failed");
        }
    }

    fn find_avd<'a>(avds: &'a [AvdInfo], id: &DeviceId) -> Option<&'a AvdInfo> {
        avds.iter().find(|a| a.id == id.as_str())
    }
}

#[async_trait]
impl<R: ProcessRunner> DeviceDriver for AndroidEmulatorDriver<R> {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn os(&self) -> DeviceOs {
        DeviceOs::Android
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Simulator
    }

    async fn discover(&self) -> Result<Vec<DeviceSpec>, DriverError> {
        let avds = scan_avds(&self.avd_home)?;
        let rows = adb::devices(&self.runner).await?;

        // Match running emulators back to AVDs by console-reported name.
        let mut running: Vec<(String, String)> = Vec::new();
        for row in rows.iter().filter(|r| r.is_emulator() && r.is_ready()) {
            match self.avd_name_for(&row.serial).await {
                Some(name) if avds.iter().any(|a| a.id == name) => {
                    running.push((name, row.serial.clone()));
                }
                Some(name) => {
                    tracing::warn!(serial = %row.serial, avd = %name, "running AVD not on disk");
                }
                None => self.reap_orphan(row).await,
            }
        }

        let mut specs = Vec::with_capacity(avds.len());
        for avd in avds {
            let serial = running
                .iter()
                .find(|(name, _)| *name == avd.id)
                .map(|(_, serial)| serial.clone());

            let mut spec = DeviceSpec {
                id: DeviceId::new(avd.id.clone()),
                os: DeviceOs::Android,
                kind: DeviceKind::Simulator,
                name: avd.display_name,
                sdk: avd.sdk,
                model: avd.model,
                width: 0,
                height: 0,
                density: 0,
                booted: serial.is_some(),
                orientation: None,
            };

            // Enrich booted rows; a flaky probe degrades to bare fields
            // rather than failing the walk.
            if let Some(serial) = serial {
                match adb::read_metrics(&self.runner, &serial).await {
                    Ok(m) => {
                        spec.width = m.width;
                        spec.height = m.height;
                        spec.density = m.density;
                    }
                    Err(e) => tracing::warn!(serial = %serial, error = %e, "metrics probe failed"),
                }
                spec.orientation = adb::get_orientation(&self.runner, &serial).await.ok();
            }
            specs.push(spec);
        }
        Ok(specs)
    }

    async fn boot(&self, id: &DeviceId) -> Result<Option<Arc<dyn ChildHandle>>, DriverError> {
        let argv = vec![
            "emulator".to_string(),
            "-avd".to_string(),
            id.as_str().to_string(),
            "-no-boot-anim".to_string(),
        ];
        let child = self.runner.spawn(&argv, &[], None).await?;
        Ok(Some(child))
    }

    async fn shutdown(&self, id: &DeviceId) -> Result<(), DriverError> {
        match self.serial_for(id).await? {
            Some(serial) => {
                self.runner
                    .run_checked(&adb::adb_argv(&serial, &["emu", "kill"]), &[], ADB_TIMEOUT)
                    .await?;
                Ok(())
            }
            // Nothing is running this AVD; shutdown already holds.
            None => Ok(()),
        }
    }

    async fn restart(&self, id: &DeviceId) -> Result<(), DriverError> {
        let serial = self.require_serial(id).await?;
        // Drop the boot marker first so the caller's boot-wait observes the
        // restart rather than the stale "1".
        adb::shell(&self.runner, &serial, &["setprop", "sys.boot_completed", "0"]).await?;
        adb::shell(&self.runner, &serial, &["stop"]).await?;
        adb::shell(&self.runner, &serial, &["start"]).await?;
        Ok(())
    }

    async fn erase(&self, id: &DeviceId) -> Result<(), DriverError> {
        let avds = scan_avds(&self.avd_home)?;
        let avd = Self::find_avd(&avds, id).ok_or_else(|| DriverError::UnknownDevice(id.clone()))?;
        // Factory reset = drop the writable images and snapshots.
        for image in ["userdata-qemu.img", "userdata-qemu.img.qcow2", "cache.img"] {
            match std::fs::remove_file(avd.dir.join(image)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        match std::fs::remove_dir_all(avd.dir.join("snapshots")) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn is_booted(&self, id: &DeviceId) -> Result<bool, DriverError> {
        match self.serial_for(id).await? {
            Some(serial) => adb::boot_completed(&self.runner, &serial).await,
            None => Ok(false),
        }
    }

    async fn read_metrics(&self, id: &DeviceId) -> Result<DeviceMetrics, DriverError> {
        let serial = self.require_serial(id).await?;
        adb::read_metrics(&self.runner, &serial).await
    }

    async fn install(&self, id: &DeviceId, app_path: &str) -> Result<(), DriverError> {
        let serial = self.require_serial(id).await?;
        adb::install(&self.runner, &serial, app_path).await
    }

    async fn uninstall(&self, id: &DeviceId, bundle_id: &str) -> Result<(), DriverError> {
        let serial = self.require_serial(id).await?;
        adb::uninstall(&self.runner, &serial, bundle_id).await
    }

    async fn launch(&self, id: &DeviceId, bundle_id: &str) -> Result<(), DriverError> {
        let serial = self.require_serial(id).await?;
        adb::launch(&self.runner, &serial, bundle_id).await
    }

    async fn get_orientation(&self, id: &DeviceId) -> Result<Orientation, DriverError> {
        let serial = self.require_serial(id).await?;
        adb::get_orientation(&self.runner, &serial).await
    }

    async fn set_orientation(
        &self,
        id: &DeviceId,
        _current: Orientation,
        target: Orientation,
    ) -> Result<(), DriverError> {
        let serial = self.require_serial(id).await?;
        adb::set_orientation(&self.runner, &serial, target).await
    }

    async fn key_event(&self, id: &DeviceId, code: u32) -> Result<(), DriverError> {
        let serial = self.require_serial(id).await?;
        adb::key_event(&self.runner, &serial, code).await
    }

    async fn lock_screen(&self, id: &DeviceId) -> Result<(), DriverError> {
        // KEYCODE_SLEEP
        self.key_event(id, 223).await
    }

    async fn press_home(&self, id: &DeviceId) -> Result<(), DriverError> {
        // KEYCODE_HOME
        self.key_event(id, 3).await
    }

    async fn shake(&self, _id: &DeviceId) -> Result<(), DriverError> {
        Err(DriverError::Unsupported { op: "shake", driver: DRIVER_NAME })
    }

    async fn set_hardware_keyboard(
        &self,
        _id: &DeviceId,
        _connected: bool,
    ) -> Result<(), DriverError> {
        Err(DriverError::Unsupported { op: "set-hardware-keyboard", driver: DRIVER_NAME })
    }

    async fn start_instrument(
        &self,
        id: &DeviceId,
        template: &str,
        artifact_dir: &Path,
    ) -> Result<Arc<dyn ChildHandle>, DriverError> {
        let serial = self.require_serial(id).await?;
        let argv = adb::adb_argv(&serial, &["shell", "am", "instrument", "-w", template]);
        Ok(self.runner.spawn(&argv, &[], Some(artifact_dir)).await?)
    }
}

#[cfg(test)]
#[path = "emu_tests.rs"]
mod tests;
