// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! iOS simulator driver backed by `xcrun simctl`.

use super::listing::{parse_simulator_list, SimulatorRow};
use crate::driver::{DeviceDriver, DriverError};
use crate::process::{ChildHandle, ProcessError, ProcessRunner};
use crate::subprocess::{DEVICE_COMMAND_TIMEOUT, SIMCTL_TIMEOUT};
use async_trait::async_trait;
use devlab_core::{DeviceId, DeviceKind, DeviceMetrics, DeviceOs, DeviceSpec, Orientation};
use std::path::Path;
use std::sync::Arc;

const DRIVER_NAME: &str = "ios-simulator";

/// Controls iOS simulators through `xcrun simctl` and the Simulator UI.
#[derive(Clone)]
pub struct IosSimulatorDriver<R: ProcessRunner> {
    runner: R,
}

impl<R: ProcessRunner> IosSimulatorDriver<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn simctl(args: &[&str]) -> Vec<String> {
        let mut argv = vec!["xcrun".to_string(), "simctl".to_string()];
        argv.extend(args.iter().map(|s| s.to_string()));
        argv
    }

    /// Keystroke sent to the Simulator app through System Events.
    fn ui_keystroke(key_code: u32, modifiers: &str) -> Vec<String> {
        vec![
            "osascript".to_string(),
            "-e".to_string(),
            "tell application \"Simulator\" to activate".to_string(),
            "-e".to_string(),
            format!(
                "tell application \"System Events\" to key code {} using {{{}}}",
                key_code, modifiers
            ),
        ]
    }

    async fn list(&self) -> Result<Vec<SimulatorRow>, DriverError> {
        let out = self
            .runner
            .run_checked(&Self::simctl(&["list", "devices"]), &[], SIMCTL_TIMEOUT)
            .await?;
        Ok(parse_simulator_list(&out.stdout))
    }

    async fn getenv_metric(&self, id: &DeviceId, var: &str) -> Result<u32, DriverError> {
        let out = self
            .runner
            .run_checked(&Self::simctl(&["getenv", id.as_str(), var]), &[], SIMCTL_TIMEOUT)
            .await?;
        out.stdout
            .trim()
            .parse::<f32>()
            .map(|v| v as u32)
            .map_err(|_| DriverError::ParseFailed {
                tool: "simctl getenv",
                detail: format!("{}={:?}", var, out.stdout.trim()),
            })
    }

    /// simctl refuses transitions the device has already made; those count
    /// as success for boot and shutdown.
    fn tolerate_state(
        result: Result<crate::process::RunOutput, ProcessError>,
        marker: &str,
    ) -> Result<(), DriverError> {
        match result {
            Ok(_) => Ok(()),
            Err(ProcessError::NonZeroExit { ref stderr, .. }) if stderr.contains(marker) => {
                tracing::debug!(stderr = %stderr, "state already settled");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<R: ProcessRunner> DeviceDriver for IosSimulatorDriver<R> {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn os(&self) -> DeviceOs {
        DeviceOs::Ios
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Simulator
    }

    async fn discover(&self) -> Result<Vec<DeviceSpec>, DriverError> {
        let rows = self.list().await?;
        Ok(rows
            .into_iter()
            .map(|row| DeviceSpec {
                id: DeviceId::new(row.udid),
                os: DeviceOs::Ios,
                kind: DeviceKind::Simulator,
                model: row.name.clone(),
                name: row.name,
                sdk: row.runtime,
                width: 0,
                height: 0,
                density: 0,
                booted: row.booted,
                orientation: None,
            })
            .collect())
    }

    async fn boot(&self, id: &DeviceId) -> Result<Option<Arc<dyn ChildHandle>>, DriverError> {
        let result = self
            .runner
            .run_checked(&Self::simctl(&["boot", id.as_str()]), &[], DEVICE_COMMAND_TIMEOUT)
            .await;
        Self::tolerate_state(result, "current state: Booted")?;
        // CoreSimulator owns the simulator process; there is no child to hand back.
        Ok(None)
    }

    async fn shutdown(&self, id: &DeviceId) -> Result<(), DriverError> {
        let result = self
            .runner
            .run_checked(&Self::simctl(&["shutdown", id.as_str()]), &[], DEVICE_COMMAND_TIMEOUT)
            .await;
        Self::tolerate_state(result, "current state: Shutdown")
    }

    async fn restart(&self, id: &DeviceId) -> Result<(), DriverError> {
        self.shutdown(id).await?;
        self.boot(id).await?;
        Ok(())
    }

    async fn erase(&self, id: &DeviceId) -> Result<(), DriverError> {
        self.runner
            .run_checked(&Self::simctl(&["erase", id.as_str()]), &[], DEVICE_COMMAND_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn is_booted(&self, id: &DeviceId) -> Result<bool, DriverError> {
        let rows = self.list().await?;
        Ok(rows.iter().any(|r| r.udid == id.as_str() && r.booted))
    }

    async fn read_metrics(&self, id: &DeviceId) -> Result<DeviceMetrics, DriverError> {
        // CoreSimulator exports main-screen geometry into the simulated env.
        let width = self.getenv_metric(id, "SIMULATOR_MAINSCREEN_WIDTH").await?;
        let height = self.getenv_metric(id, "SIMULATOR_MAINSCREEN_HEIGHT").await?;
        let density = self.getenv_metric(id, "SIMULATOR_MAINSCREEN_SCALE").await?;
        Ok(DeviceMetrics { width, height, density })
    }

    async fn install(&self, id: &DeviceId, app_path: &str) -> Result<(), DriverError> {
        self.runner
            .run_checked(
                &Self::simctl(&["install", id.as_str(), app_path]),
                &[],
                DEVICE_COMMAND_TIMEOUT,
            )
            .await?;
        Ok(())
    }

    async fn uninstall(&self, id: &DeviceId, bundle_id: &str) -> Result<(), DriverError> {
        self.runner
            .run_checked(
                &Self::simctl(&["uninstall", id.as_str(), bundle_id]),
                &[],
                DEVICE_COMMAND_TIMEOUT,
            )
            .await?;
        Ok(())
    }

    async fn launch(&self, id: &DeviceId, bundle_id: &str) -> Result<(), DriverError> {
        let result = self
            .runner
            .run_checked(
                &Self::simctl(&["launch", id.as_str(), bundle_id]),
                &[],
                DEVICE_COMMAND_TIMEOUT,
            )
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(ProcessError::NonZeroExit { stderr, .. }) => {
                Err(DriverError::LaunchFailed { detail: stderr })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_orientation(&self, id: &DeviceId) -> Result<Orientation, DriverError> {
        let _ = id;
        // simctl has no orientation read-back; callers keep the optimistic value.
        Err(DriverError::Unsupported { op: "get-orientation", driver: DRIVER_NAME })
    }

    async fn set_orientation(
        &self,
        _id: &DeviceId,
        current: Orientation,
        target: Orientation,
    ) -> Result<(), DriverError> {
        let clockwise_turns = (u32::from(target.index()) + 4 - u32::from(current.index())) % 4;
        // Key codes 123/124: left/right arrow; the Simulator menu binds
        // cmd-left/cmd-right to rotate.
        let (key_code, turns) = match clockwise_turns {
            0 => return Ok(()),
            3 => (123, 1),
            n => (124, n),
        };
        for _ in 0..turns {
            self.runner
                .run_checked(&Self::ui_keystroke(key_code, "command down"), &[], SIMCTL_TIMEOUT)
                .await?;
        }
        Ok(())
    }

    async fn key_event(&self, _id: &DeviceId, _code: u32) -> Result<(), DriverError> {
        Err(DriverError::Unsupported { op: "key-event", driver: DRIVER_NAME })
    }

    async fn lock_screen(&self, _id: &DeviceId) -> Result<(), DriverError> {
        // cmd-L (key code 37)
        self.runner
            .run_checked(&Self::ui_keystroke(37, "command down"), &[], SIMCTL_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn press_home(&self, _id: &DeviceId) -> Result<(), DriverError> {
        // cmd-shift-H (key code 4)
        self.runner
            .run_checked(
                &Self::ui_keystroke(4, "command down, shift down"),
                &[],
                SIMCTL_TIMEOUT,
            )
            .await?;
        Ok(())
    }

    async fn shake(&self, _id: &DeviceId) -> Result<(), DriverError> {
        // ctrl-cmd-Z (key code 6)
        self.runner
            .run_checked(
                &Self::ui_keystroke(6, "command down, control down"),
                &[],
                SIMCTL_TIMEOUT,
            )
            .await?;
        Ok(())
    }

    async fn set_hardware_keyboard(
        &self,
        _id: &DeviceId,
        connected: bool,
    ) -> Result<(), DriverError> {
        let argv = vec![
            "defaults".to_string(),
            "write".to_string(),
            "com.apple.iphonesimulator".to_string(),
            "ConnectHardwareKeyboard".to_string(),
            "-bool".to_string(),
            connected.to_string(),
        ];
        self.runner.run_checked(&argv, &[], SIMCTL_TIMEOUT).await?;
        Ok(())
    }

    async fn start_instrument(
        &self,
        id: &DeviceId,
        template: &str,
        artifact_dir: &Path,
    ) -> Result<Arc<dyn ChildHandle>, DriverError> {
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
#[path = "sim_tests.rs"]
mod tests;
