// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical per-device record.
//!
//! One [`DeviceRecord`] exists per discovered device and persists for the
//! process lifetime; rediscovery refreshes it in place. The record holds at
//! most a session *token*; session ownership lives in the session
//! registry, never in the record.

use crate::id::{DeviceId, SessionToken};
use crate::orientation::Orientation;
use crate::state::{DeviceState, StateEvent};
use crate::storage::DeviceStorage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Operating system family of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceOs {
    Ios,
    Android,
}

impl DeviceOs {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceOs::Ios => "ios",
            DeviceOs::Android => "android",
        }
    }
}

impl fmt::Display for DeviceOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a device is emulated or real hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Simulator,
    Physical,
}

impl DeviceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Simulator => "simulator",
            DeviceKind::Physical => "physical",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a device as reported by one discovery walk.
///
/// Drivers produce these; the discovery coordinator merges them into
/// [`DeviceRecord`]s keyed by id.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSpec {
    pub id: DeviceId,
    pub os: DeviceOs,
    pub kind: DeviceKind,
    pub name: String,
    pub sdk: String,
    pub model: String,
    pub width: u32,
    pub height: u32,
    pub density: u32,
    pub booted: bool,
    /// Reported orientation, where the backend exposes one.
    pub orientation: Option<Orientation>,
}

/// Screen metrics read back from a booted device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceMetrics {
    pub width: u32,
    pub height: u32,
    pub density: u32,
}

/// Canonical mutable record for one device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRecord {
    pub id: DeviceId,
    pub os: DeviceOs,
    pub kind: DeviceKind,
    pub name: String,
    pub sdk: String,
    pub model: String,
    pub width: u32,
    pub height: u32,
    pub density: u32,
    pub orientation: Orientation,
    pub state: DeviceState,
    /// Token of the single live session, if any.
    pub current_session: Option<SessionToken>,
    pub local_storage_path: PathBuf,
    pub temp_storage_path: PathBuf,
}

impl DeviceRecord {
    /// Build a record from a discovery snapshot, creating its storage
    /// directories.
    pub fn from_spec(spec: &DeviceSpec, storage: &DeviceStorage) -> io::Result<Self> {
        storage.ensure_device_dirs(&spec.id)?;
        Ok(Self {
            id: spec.id.clone(),
            os: spec.os,
            kind: spec.kind,
            name: spec.name.clone(),
            sdk: spec.sdk.clone(),
            model: spec.model.clone(),
            width: spec.width,
            height: spec.height,
            density: spec.density,
            orientation: Orientation::default(),
            state: DeviceState::Unknown.apply(StateEvent::Discovered { booted: spec.booted })
                .unwrap_or(DeviceState::Unknown),
            current_session: None,
            local_storage_path: storage.device_dir(&spec.id),
            temp_storage_path: storage.temp_dir(&spec.id),
        })
    }

    /// Refresh mutable fields from a later discovery snapshot.
    ///
    /// The id is immutable; the state is corrected through the state
    /// machine's refresh rule so in-flight transitions are preserved.
    pub fn refresh_from(&mut self, spec: &DeviceSpec) {
        self.name = spec.name.clone();
        self.sdk = spec.sdk.clone();
        self.model = spec.model.clone();
        if spec.width > 0 {
            self.width = spec.width;
        }
        if spec.height > 0 {
            self.height = spec.height;
        }
        if spec.density > 0 {
            self.density = spec.density;
        }
        if let Some(orientation) = spec.orientation {
            self.orientation = orientation;
        }
        if let Ok(next) = self.state.apply(StateEvent::Refresh { booted: spec.booted }) {
            self.state = next;
        }
    }

    /// Apply metrics read after a successful boot.
    pub fn apply_metrics(&mut self, m: DeviceMetrics) {
        if m.width > 0 {
            self.width = m.width;
        }
        if m.height > 0 {
            self.height = m.height;
        }
        if m.density > 0 {
            self.density = m.density;
        }
    }
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {} {})",
            self.name,
            self.os,
            self.kind,
            self.id.short(8)
        )
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
