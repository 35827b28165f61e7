// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AVD configuration tree scanning.
//!
//! The AVD home holds one `<name>.avd/` directory plus a sibling
//! `<name>.ini` per virtual device:
//!
//! ```text
//! ~/.android/avd/
//!   pixel_7.ini            target=android-34
//!   pixel_7.avd/
//!     config.ini           AvdId, avd.ini.displayname, hw.device.name
//! ```

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// One virtual device found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvdInfo {
    /// Stable AVD id (the `AvdId` key, falling back to the directory stem).
    pub id: String,
    /// Human-facing name (`avd.ini.displayname`, falling back to the id).
    pub display_name: String,
    /// SDK level parsed from the sibling ini's `target` line.
    pub sdk: String,
    /// Hardware profile (`hw.device.name`).
    pub model: String,
    /// The `<name>.avd` directory.
    pub dir: PathBuf,
}

/// Resolve the AVD home directory.
///
/// `ANDROID_AVD_HOME` wins; otherwise `ANDROID_SDK_HOME` (the directory
/// holding `.android`) or the user home.
pub fn avd_home() -> PathBuf {
    if let Ok(home) = std::env::var("ANDROID_AVD_HOME") {
        return PathBuf::from(home);
    }
    let base = std::env::var("ANDROID_SDK_HOME")
        .map(PathBuf::from)
        .ok()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"));
    base.join(".android").join("avd")
}

/// Scan the AVD home for configured virtual devices.
///
/// A missing home directory is an empty fleet, not an error. Entries whose
/// `config.ini` is unreadable are skipped with a warning.
pub fn scan_avds(home: &Path) -> io::Result<Vec<AvdInfo>> {
    let entries = match std::fs::read_dir(home) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut avds = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let Some(stem) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(".avd"))
        else {
            continue;
        };
        if !path.is_dir() {
            continue;
        }

        let config = match std::fs::read_to_string(path.join("config.ini")) {
            Ok(content) => parse_ini(&content),
            Err(e) => {
                tracing::warn!(avd = stem, error = %e, "skipping unreadable config.ini");
                continue;
            }
        };

        let sibling = std::fs::read_to_string(home.join(format!("{stem}.ini")))
            .map(|content| parse_ini(&content))
            .unwrap_or_default();

        let id = config
            .get("AvdId")
            .cloned()
            .unwrap_or_else(|| stem.to_string());
        let display_name = config
            .get("avd.ini.displayname")
            .cloned()
            .unwrap_or_else(|| id.clone());
        let sdk = sibling
            .get("target")
            .and_then(|t| sdk_from_target(t))
            .unwrap_or_default();
        let model = config.get("hw.device.name").cloned().unwrap_or_default();

        avds.push(AvdInfo { id, display_name, sdk, model, dir: path });
    }
    avds.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(avds)
}

/// Parse ini-style `key=value` lines into a map.
fn parse_ini(content: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }
        if let Some(eq_pos) = trimmed.find('=') {
            let key = trimmed[..eq_pos].trim().to_string();
            let value = trimmed[eq_pos + 1..].trim().to_string();
            if !key.is_empty() {
                map.insert(key, value);
            }
        }
    }
    map
}

/// Extract the SDK level from a target line.
///
/// Handles both `android-34` and addon targets like
/// `Google Inc.:Google APIs:23`.
fn sdk_from_target(target: &str) -> Option<String> {
    let tail = target
        .rsplit(|c| c == '-' || c == ':')
        .next()
        .unwrap_or(target);
    if tail.chars().all(|c| c.is_ascii_digit()) && !tail.is_empty() {
        Some(tail.to_string())
    } else {
        None
    }
}

#[cfg(test)]
#[path = "avd_tests.rs"]
mod tests;
