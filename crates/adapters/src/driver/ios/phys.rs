// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Physical iOS device driver.
//!
//! Hardware devices are discovered through `instruments -s devices` and
//! classified against the simulator listing. Lifecycle control of hardware
//! is not expressible through the command-line tools, so everything beyond
//! discovery reports [`DriverError::Unsupported`].

use super::listing::{parse_instruments_devices, parse_simulator_list};
use crate::driver::{DeviceDriver, DriverError};
use crate::process::{ChildHandle, ProcessRunner};
use crate::subprocess::SIMCTL_TIMEOUT;
use async_trait::async_trait;
use devlab_core::{DeviceId, DeviceKind, DeviceMetrics, DeviceOs, DeviceSpec, Orientation};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

const DRIVER_NAME: &str = "ios-physical";

/// Lists attached iOS hardware; a thin stub for everything else.
#[derive(Clone)]
pub struct IosPhysicalDriver<R: ProcessRunner> {
    runner: R,
}

impl<R: ProcessRunner> IosPhysicalDriver<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn unsupported<T>(op: &'static str) -> Result<T, DriverError> {
        Err(DriverError::Unsupported { op, driver: DRIVER_NAME })
    }
}

#[async_trait]
impl<R: ProcessRunner> DeviceDriver for IosPhysicalDriver<R> {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn os(&self) -> DeviceOs {
        DeviceOs::Ios
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Physical
    }

    async fn discover(&self) -> Result<Vec<DeviceSpec>, DriverError> {
        let instruments = vec![
            "instruments".to_string(),
            "-s".to_string(),
            "devices".to_string(),
        ];
        let listed = self
            .runner
            .run_checked(&instruments, &[], SIMCTL_TIMEOUT)
            .await?;

        // A row is physical when instruments does not mark it as a simulator
        // AND the udid is absent from the simulator listing.
        let sims = vec![
            "xcrun".to_string(),
            "simctl".to_string(),
            "list".to_string(),
            "devices".to_string(),
        ];
        let sim_out = self.runner.run_checked(&sims, &[], SIMCTL_TIMEOUT).await?;
        let sim_udids: HashSet<String> = parse_simulator_list(&sim_out.stdout)
            .into_iter()
            .map(|r| r.udid)
            .collect();

        Ok(parse_instruments_devices(&listed.stdout)
            .into_iter()
            .filter(|row| !row.simulator && !sim_udids.contains(&row.udid))
            .map(|row| DeviceSpec {
                id: DeviceId::new(row.udid),
                os: DeviceOs::Ios,
                kind: DeviceKind::Physical,
                model: row.name.clone(),
                name: row.name,
                sdk: row.runtime,
                width: 0,
                height: 0,
                density: 0,
                // Hardware that shows up in the listing is attached and on.
                booted: true,
                orientation: None,
            })
            .collect())
    }

    async fn boot(&self, _id: &DeviceId) -> Result<Option<Arc<dyn ChildHandle>>, DriverError> {
        Self::unsupported("boot")
    }

    async fn shutdown(&self, _id: &DeviceId) -> Result<(), DriverError> {
        Self::unsupported("shutdown")
    }

    async fn restart(&self, _id: &DeviceId) -> Result<(), DriverError> {
        Self::unsupported("restart")
    }

    async fn erase(&self, _id: &DeviceId) -> Result<(), DriverError> {
        Self::unsupported("erase")
    }

    async fn is_booted(&self, id: &DeviceId) -> Result<bool, DriverError> {
        let specs = self.discover().await?;
        Ok(specs.iter().any(|s| s.id == *id))
    }

    async fn read_metrics(&self, _id: &DeviceId) -> Result<DeviceMetrics, DriverError> {
        Ok(DeviceMetrics::default())
    }

    async fn install(&self, _id: &DeviceId, _app_path: &str) -> Result<(), DriverError> {
        Self::unsupported("install")
    }

    async fn uninstall(&self, _id: &DeviceId, _bundle_id: &str) -> Result<(), DriverError> {
        Self::unsupported("uninstall")
    }

    async fn launch(&self, _id: &DeviceId, _bundle_id: &str) -> Result<(), DriverError> {
        Self::unsupported("launch")
    }

    async fn get_orientation(&self, _id: &DeviceId) -> Result<Orientation, DriverError> {
        Self::unsupported("get-orientation")
    }

    async fn set_orientation(
        &self,
        _id: &DeviceId,
        _current: Orientation,
        _target: Orientation,
    ) -> Result<(), DriverError> {
        Self::unsupported("set-orientation")
    }

    async fn key_event(&self, _id: &DeviceId, _code: u32) -> Result<(), DriverError> {
        Self::unsupported("key-event")
    }

    async fn lock_screen(&self, _id: &DeviceId) -> Result<(), DriverError> {
        Self::unsupported("lock-screen")
    }

    async fn press_home(&self, _id: &DeviceId) -> Result<(), DriverError> {
        Self::unsupported("press-home")
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
        // instruments drives hardware exactly like simulators.
        let argv = vec![
            "xcrun".to_string(),
            "instruments".to_string(),
            "-w".to_string(),
            id.as_str().to_string(),
            "-t".to_string(),
            template.to_string(),
        ];
        Ok(self.runner.spawn(&argv, &[], Some(artifact_dir)).await?)
    }
}

#[cfg(test)]
#[path = "phys_tests.rs"]
mod tests;
