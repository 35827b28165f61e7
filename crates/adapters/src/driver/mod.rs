// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device driver contract.
//!
//! A driver supplies the OS-specific operations for one family of devices
//! (iOS simulators, iOS hardware, Android emulators, Android hardware). The
//! engine routes every backend interaction through this trait and never
//! shells out directly, so a scripted [`FakeDriver`] can stand in for a
//! whole device lab in tests.

pub mod android;
pub mod ios;

pub use android::{AndroidEmulatorDriver, AndroidPhysicalDriver};
pub use ios::{IosPhysicalDriver, IosSimulatorDriver};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{DriverCall, FakeDriver};

use crate::process::{ChildHandle, ProcessError};
use async_trait::async_trait;
use devlab_core::{DeviceId, DeviceKind, DeviceMetrics, DeviceOs, DeviceSpec, Orientation};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors from driver operations
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("unparseable {tool} output: {detail}")]
    ParseFailed { tool: &'static str, detail: String },
    #[error("launch failed: {detail}")]
    LaunchFailed { detail: String },
    #[error("{op} is not supported by the {driver} driver")]
    Unsupported { op: &'static str, driver: &'static str },
    #[error("unknown device: {0}")]
    UnknownDevice(DeviceId),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Backend operations for one family of devices.
///
/// Object-safe: the registry holds a heterogeneous set of drivers as
/// `Arc<dyn DeviceDriver>`. Thin backends report [`DriverError::Unsupported`]
/// for operations their platform cannot express; the engine surfaces those
/// unchanged.
#[async_trait]
pub trait DeviceDriver: Send + Sync + 'static {
    /// Stable driver name used in configuration and logs.
    fn name(&self) -> &'static str;

    fn os(&self) -> DeviceOs;

    fn kind(&self) -> DeviceKind;

    /// Walk external state and report every device this backend can see.
    async fn discover(&self) -> Result<Vec<DeviceSpec>, DriverError>;

    /// Start the device. Returns a child handle when the backend owns the
    /// booted process (Android emulators); `None` when the platform runtime
    /// owns it (CoreSimulator).
    async fn boot(&self, id: &DeviceId) -> Result<Option<Arc<dyn ChildHandle>>, DriverError>;

    async fn shutdown(&self, id: &DeviceId) -> Result<(), DriverError>;

    /// Restart a booted device in place.
    async fn restart(&self, id: &DeviceId) -> Result<(), DriverError>;

    /// Factory-reset a shut-down device.
    async fn erase(&self, id: &DeviceId) -> Result<(), DriverError>;

    /// Snapshot liveness probe; one failed probe is not fatal to a boot wait.
    async fn is_booted(&self, id: &DeviceId) -> Result<bool, DriverError>;

    /// Screen metrics of a booted device.
    async fn read_metrics(&self, id: &DeviceId) -> Result<DeviceMetrics, DriverError>;

    async fn install(&self, id: &DeviceId, app_path: &str) -> Result<(), DriverError>;

    async fn uninstall(&self, id: &DeviceId, bundle_id: &str) -> Result<(), DriverError>;

    async fn launch(&self, id: &DeviceId, bundle_id: &str) -> Result<(), DriverError>;

    /// Reported orientation, where the platform exposes one.
    async fn get_orientation(&self, id: &DeviceId) -> Result<Orientation, DriverError>;

    /// Rotate from `current` to `target`. Backends that can only turn
    /// relative to the current position derive the turn count from the pair.
    async fn set_orientation(
        &self,
        id: &DeviceId,
        current: Orientation,
        target: Orientation,
    ) -> Result<(), DriverError>;

    async fn key_event(&self, id: &DeviceId, code: u32) -> Result<(), DriverError>;

    async fn lock_screen(&self, id: &DeviceId) -> Result<(), DriverError>;

    async fn press_home(&self, id: &DeviceId) -> Result<(), DriverError>;

    async fn shake(&self, id: &DeviceId) -> Result<(), DriverError>;

    async fn set_hardware_keyboard(
        &self,
        id: &DeviceId,
        connected: bool,
    ) -> Result<(), DriverError>;

    /// Attach a measurement subprocess to a booted device. The child runs
    /// with `artifact_dir` as its working directory so trace output lands in
    /// the device's storage.
    async fn start_instrument(
        &self,
        id: &DeviceId,
        template: &str,
        artifact_dir: &Path,
    ) -> Result<Arc<dyn ChildHandle>, DriverError>;
}

impl std::fmt::Debug for dyn DeviceDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceDriver").field("name", &self.name()).finish()
    }
}

/// Capability check applied to every discovered device at registration.
///
/// A spec missing a required field is dropped from discovery results rather
/// than surfacing a half-usable device.
pub fn validate_spec(spec: &DeviceSpec) -> Result<(), String> {
    if spec.id.as_str().is_empty() {
        return Err("empty device id".to_string());
    }
    if spec.name.is_empty() {
        return Err(format!("device {} has no name", spec.id));
    }
    if spec.sdk.is_empty() {
        return Err(format!("device {} has no sdk", spec.id));
    }
    Ok(())
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
