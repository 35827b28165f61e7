// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration-driven driver loading.
//!
//! Drivers are selected by name. An unknown or duplicated name rejects the
//! whole configuration at startup, before any discovery runs.

use crate::error::ControlError;
use devlab_adapters::{
    AndroidEmulatorDriver, AndroidPhysicalDriver, DeviceDriver, IosPhysicalDriver,
    IosSimulatorDriver, SystemProcessRunner, TracedDriver,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Driver names recognized in configuration.
pub const KNOWN_DRIVERS: &[&str] = &[
    "ios-simulator",
    "ios-physical",
    "android-emulator",
    "android-physical",
];

/// Build the configured drivers, traced, over the system process runner.
pub fn load_drivers(
    names: &[String],
    runner: SystemProcessRunner,
) -> Result<Vec<Arc<dyn DeviceDriver>>, ControlError> {
    if names.is_empty() {
        return Err(ControlError::Config("no drivers configured".to_string()));
    }

    let mut seen = HashSet::new();
    let mut drivers: Vec<Arc<dyn DeviceDriver>> = Vec::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ControlError::DriverInvalid {
                name: name.clone(),
                reason: "listed more than once".to_string(),
            });
        }
        let driver: Arc<dyn DeviceDriver> = match name.as_str() {
            "ios-simulator" => {
                Arc::new(TracedDriver::new(IosSimulatorDriver::new(runner.clone())))
            }
            "ios-physical" => Arc::new(TracedDriver::new(IosPhysicalDriver::new(runner.clone()))),
            "android-emulator" => {
                Arc::new(TracedDriver::new(AndroidEmulatorDriver::new(runner.clone())))
            }
            "android-physical" => {
                Arc::new(TracedDriver::new(AndroidPhysicalDriver::new(runner.clone())))
            }
            other => {
                return Err(ControlError::DriverInvalid {
                    name: other.to_string(),
                    reason: "unknown driver".to_string(),
                })
            }
        };
        drivers.push(driver);
    }
    Ok(drivers)
}

#[cfg(test)]
#[path = "drivers_tests.rs"]
mod tests;
