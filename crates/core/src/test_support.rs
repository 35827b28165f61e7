// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::device::{DeviceKind, DeviceOs, DeviceSpec};
use crate::id::DeviceId;

/// A shut-down iOS simulator spec with empty metrics.
pub fn sample_spec(id: &str, name: &str) -> DeviceSpec {
    DeviceSpec {
        id: DeviceId::new(id),
        os: DeviceOs::Ios,
        kind: DeviceKind::Simulator,
        name: name.to_string(),
        sdk: "17.0".to_string(),
        model: "iPhone".to_string(),
        width: 0,
        height: 0,
        density: 0,
        booted: false,
        orientation: None,
    }
}

/// Like [`sample_spec`] but with an explicit booted flag.
pub fn spec_with_state(id: &str, name: &str, booted: bool) -> DeviceSpec {
    DeviceSpec {
        booted,
        ..sample_spec(id, name)
    }
}

/// An Android emulator spec (AVD id, adb-style metrics).
pub fn android_spec(id: &str, name: &str, booted: bool) -> DeviceSpec {
    DeviceSpec {
        id: DeviceId::new(id),
        os: DeviceOs::Android,
        kind: DeviceKind::Simulator,
        name: name.to_string(),
        sdk: "34".to_string(),
        model: "pixel_7".to_string(),
        width: 1080,
        height: 2400,
        density: 420,
        booted,
        orientation: None,
    }
}
