// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-device on-disk storage layout.
//!
//! Every device owns a directory under `<home>/.DeviceStorage/` named by the
//! md5 of its id:
//!
//! ```text
//! <home>/.DeviceStorage/<md5(id)>/
//!   .lock     advisory lock file, "<0|1>.<pid>"
//!   temp/     scratch area, recreated on purge
//!   *.trace   instrumentation artifacts
//! ```

use crate::id::DeviceId;
use std::io;
use std::path::{Path, PathBuf};

const STORAGE_DIR_NAME: &str = ".DeviceStorage";

/// Resolver for the device storage tree.
#[derive(Debug, Clone)]
pub struct DeviceStorage {
    root: PathBuf,
}

impl DeviceStorage {
    /// Storage rooted at an explicit directory (tests use a tempdir).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage under the user's home directory.
    ///
    /// `DEVLAB_HOME` overrides the platform home for isolation; `/tmp` is
    /// the last-resort fallback.
    pub fn resolve() -> Self {
        let home = std::env::var("DEVLAB_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("/tmp"));
        Self::new(home.join(STORAGE_DIR_NAME))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory owned by one device: `<root>/<md5(id)>`.
    pub fn device_dir(&self, id: &DeviceId) -> PathBuf {
        self.root.join(format!("{:x}", md5::compute(id.as_str())))
    }

    /// Scratch directory: `<device_dir>/temp`.
    pub fn temp_dir(&self, id: &DeviceId) -> PathBuf {
        self.device_dir(id).join("temp")
    }

    /// Lock file path: `<device_dir>/.lock`.
    pub fn lock_path(&self, id: &DeviceId) -> PathBuf {
        self.device_dir(id).join(".lock")
    }

    /// Create the device and temp directories if absent.
    pub fn ensure_device_dirs(&self, id: &DeviceId) -> io::Result<()> {
        std::fs::create_dir_all(self.temp_dir(id))
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
