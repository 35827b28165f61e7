// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Physical Android device driver.
//!
//! Hardware is addressed by adb serial. Power control is out of reach, but
//! the adb surface (apps, input, rotation) works the same as on emulators.

use super::adb;
use crate::driver::{DeviceDriver, DriverError};
use crate::process::{ChildHandle, ProcessRunner};
use async_trait::async_trait;
use devlab_core::{DeviceId, DeviceKind, DeviceMetrics, DeviceOs, DeviceSpec, Orientation};
use std::path::Path;
use std::sync::Arc;

const DRIVER_NAME: &str = "android-physical";

/// Controls attached Android hardware through adb.
#[derive(Clone)]
pub struct AndroidPhysicalDriver<R: ProcessRunner> {
    runner: R,
}

impl<R: ProcessRunner> AndroidPhysicalDriver<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn unsupported<T>(op: &'static str) -> Result<T, DriverError> {
        Err(DriverError::Unsupported { op, driver: DRIVER_NAME })
    }

    async fn is_attached(&self, id: &DeviceId) -> Result<bool, DriverError> {
        let rows = adb::devices(&self.runner).await?;
        Ok(rows
            .iter()
            .any(|r| !r.is_emulator() && r.is_ready() && r.serial == id.as_str()))
    }
}

#[async_trait]
impl<R: ProcessRunner> DeviceDriver for AndroidPhysicalDriver<R> {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn os(&self) -> DeviceOs {
        DeviceOs::Android
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Physical
    }

    async fn discover(&self) -> Result<Vec<DeviceSpec>, DriverError> {
        let rows = adb::devices(&self.runner).await?;
        let mut specs = Vec::new();
        for row in rows.iter().filter(|r| !r.is_emulator() && r.is_ready()) {
            let serial = &row.serial;
            let model = adb::getprop(&self.runner, serial, "ro.product.device")
                .await
                .unwrap_or_default();
            let sdk = adb::getprop(&self.runner, serial, "ro.build.version.sdk")
                .await
                .unwrap_or_default();
            let booted = adb::boot_completed(&self.runner, serial)
                .await
                .unwrap_or(false);

            let mut spec = DeviceSpec {
                id: DeviceId::new(serial.clone()),
                os: DeviceOs::Android,
                kind: DeviceKind::Physical,
                name: model.clone(),
                sdk,
                model,
                width: 0,
                height: 0,
                density: 0,
                booted,
                orientation: None,
            };
            if booted {
                if let Ok(m) = adb::read_metrics(&self.runner, serial).await {
                    spec.width = m.width;
                    spec.height = m.height;
                    spec.density = m.density;
                }
                spec.orientation = adb::get_orientation(&self.runner, serial).await.ok();
            }
            specs.push(spec);
        }
        Ok(specs)
    }

    async fn boot(&self, _id: &DeviceId) -> Result<Option<Arc<dyn ChildHandle>>, DriverError> {
        Self::unsupported("boot")
    }

    async fn shutdown(&self, _id: &DeviceId) -> Result<(), DriverError> {
        Self::unsupported("shutdown")
    }

    async fn restart(&self, id: &DeviceId) -> Result<(), DriverError> {
        adb::shell(&self.runner, id.as_str(), &["setprop", "sys.boot_completed", "0"]).await?;
        adb::shell(&self.runner, id.as_str(), &["stop"]).await?;
        adb::shell(&self.runner, id.as_str(), &["start"]).await?;
        Ok(())
    }

    async fn erase(&self, _id: &DeviceId) -> Result<(), DriverError> {
        Self::unsupported("erase")
    }

    async fn is_booted(&self, id: &DeviceId) -> Result<bool, DriverError> {
        if !self.is_attached(id).await? {
            return Ok(false);
        }
        adb::boot_completed(&self.runner, id.as_str()).await
    }

    async fn read_metrics(&self, id: &DeviceId) -> Result<DeviceMetrics, DriverError> {
        adb::read_metrics(&self.runner, id.as_str()).await
    }

    async fn install(&self, id: &DeviceId, app_path: &str) -> Result<(), DriverError> {
        adb::install(&self.runner, id.as_str(), app_path).await
    }

    async fn uninstall(&self, id: &DeviceId, bundle_id: &str) -> Result<(), DriverError> {
        adb::uninstall(&self.runner, id.as_str(), bundle_id).await
    }

    async fn launch(&self, id: &DeviceId, bundle_id: &str) -> Result<(), DriverError> {
        adb::launch(&self.runner, id.as_str(), bundle_id).await
    }

    async fn get_orientation(&self, id: &DeviceId) -> Result<Orientation, DriverError> {
        adb::get_orientation(&self.runner, id.as_str()).await
    }

    async fn set_orientation(
        &self,
        id: &DeviceId,
        _current: Orientation,
        target: Orientation,
    ) -> Result<(), DriverError> {
        adb::set_orientation(&self.runner, id.as_str(), target).await
    }

    async fn key_event(&self, id: &DeviceId, code: u32) -> Result<(), DriverError> {
        adb::key_event(&self.runner, id.as_str(), code).await
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
        Self::unsupported("shake")
    }

    async fn set_hardware_keyboard(
        &self,
        _id: &DeviceId,
        _connected: bool,
    ) -> Result<(), DriverError> {
        Self::unsupported("set-hardware-keyboard")
    }

    async fn start_instrument(
        &self,
        id: &DeviceId,
        template: &str,
        artifact_dir: &Path,
    ) -> Result<Arc<dyn ChildHandle>, DriverError> {
        let argv = adb::adb_argv(id.as_str(), &["shell", "am", "instrument", "-w", template]);
        Ok(self.runner.spawn(&argv, &[], Some(artifact_dir)).await?)
    }
}

#[cfg(test)]
#[path = "phys_tests.rs"]
mod tests;
