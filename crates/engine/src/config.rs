// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane configuration, loaded once at startup.

use crate::error::ControlError;
use serde::Deserialize;
use std::path::Path;

/// Configuration file contents.
///
/// ```toml
/// drivers = ["ios-simulator", "android-emulator"]
/// device_session_timeout = 300000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Drivers to load, by name.
    pub drivers: Vec<String>,
    /// Session TTL in milliseconds.
    pub device_session_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drivers: crate::drivers::KNOWN_DRIVERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            device_session_timeout: devlab_core::session::DEFAULT_SESSION_TTL_MS,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ControlError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ControlError::Config(e.to_string()))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
