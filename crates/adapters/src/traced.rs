// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced driver wrapper for consistent observability

use crate::driver::{DeviceDriver, DriverError};
use crate::process::ChildHandle;
use async_trait::async_trait;
use devlab_core::{DeviceId, DeviceKind, DeviceMetrics, DeviceOs, DeviceSpec, Orientation};
use std::path::Path;
use std::sync::Arc;
use tracing::Instrument;

/// Wrapper that adds tracing to any [`DeviceDriver`]
pub struct TracedDriver<D> {
    inner: D,
}

impl<D> TracedDriver<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }
}

impl<D: DeviceDriver> TracedDriver<D> {
    fn log_result<T>(op: &'static str, result: &Result<T, DriverError>) {
        if let Err(e) = result {
            tracing::error!(op, error = %e, "driver operation failed");
        }
    }
}

#[async_trait]
impl<D: DeviceDriver> DeviceDriver for TracedDriver<D> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn os(&self) -> DeviceOs {
        self.inner.os()
    }

    fn kind(&self) -> DeviceKind {
        self.inner.kind()
    }

    async fn discover(&self) -> Result<Vec<DeviceSpec>, DriverError> {
        let driver = self.inner.name();
        async {
            let start = std::time::Instant::now();
            let result = self.inner.discover().await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(specs) => tracing::info!(elapsed_ms, devices = specs.len(), "walk complete"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "walk failed"),
            }
            result
        }
        .instrument(tracing::info_span!("driver.discover", driver))
        .await
    }

    async fn boot(&self, id: &DeviceId) -> Result<Option<Arc<dyn ChildHandle>>, DriverError> {
        let result = self
            .inner
            .boot(id)
            .instrument(tracing::info_span!("driver.boot", device = %id.short(12)))
            .await;
        Self::log_result("boot", &result);
        result
    }

    async fn shutdown(&self, id: &DeviceId) -> Result<(), DriverError> {
        let result = self
            .inner
            .shutdown(id)
            .instrument(tracing::info_span!("driver.shutdown", device = %id.short(12)))
            .await;
        Self::log_result("shutdown", &result);
        result
    }

    async fn restart(&self, id: &DeviceId) -> Result<(), DriverError> {
        let result = self.inner.restart(id).await;
        Self::log_result("restart", &result);
        result
    }

    async fn erase(&self, id: &DeviceId) -> Result<(), DriverError> {
        let result = self.inner.erase(id).await;
        Self::log_result("erase", &result);
        result
    }

    async fn is_booted(&self, id: &DeviceId) -> Result<bool, DriverError> {
        self.inner.is_booted(id).await
    }

    async fn read_metrics(&self, id: &DeviceId) -> Result<DeviceMetrics, DriverError> {
        self.inner.read_metrics(id).await
    }

    async fn install(&self, id: &DeviceId, app_path: &str) -> Result<(), DriverError> {
        let result = self
            .inner
            .install(id, app_path)
            .instrument(tracing::info_span!("driver.install", device = %id.short(12), app_path))
            .await;
        Self::log_result("install", &result);
        result
    }

    async fn uninstall(&self, id: &DeviceId, bundle_id: &str) -> Result<(), DriverError> {
        let result = self.inner.uninstall(id, bundle_id).await;
        Self::log_result("uninstall", &result);
        result
    }

    async fn launch(&self, id: &DeviceId, bundle_id: &str) -> Result<(), DriverError> {
        let result = self
            .inner
            .launch(id, bundle_id)
            .instrument(tracing::info_span!("driver.launch", device = %id.short(12), bundle_id))
            .await;
        Self::log_result("launch", &result);
        result
    }

    async fn get_orientation(&self, id: &DeviceId) -> Result<Orientation, DriverError> {
        self.inner.get_orientation(id).await
    }

    async fn set_orientation(
        &self,
        id: &DeviceId,
        current: Orientation,
        target: Orientation,
    ) -> Result<(), DriverError> {
        let result = self.inner.set_orientation(id, current, target).await;
        Self::log_result("set-orientation", &result);
        result
    }

    async fn key_event(&self, id: &DeviceId, code: u32) -> Result<(), DriverError> {
        self.inner.key_event(id, code).await
    }

    async fn lock_screen(&self, id: &DeviceId) -> Result<(), DriverError> {
        self.inner.lock_screen(id).await
    }

    async fn press_home(&self, id: &DeviceId) -> Result<(), DriverError> {
        self.inner.press_home(id).await
    }

    async fn shake(&self, id: &DeviceId) -> Result<(), DriverError> {
        self.inner.shake(id).await
    }

    async fn set_hardware_keyboard(
        &self,
        id: &DeviceId,
        connected: bool,
    ) -> Result<(), DriverError> {
        self.inner.set_hardware_keyboard(id, connected).await
    }

    async fn start_instrument(
        &self,
        id: &DeviceId,
        template: &str,
        artifact_dir: &Path,
    ) -> Result<Arc<dyn ChildHandle>, DriverError> {
        let result = self
            .inner
            .start_instrument(id, template, artifact_dir)
            .instrument(tracing::info_span!("driver.instrument", device = %id.short(12), template))
            .await;
        Self::log_result("start-instrument", &result);
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
