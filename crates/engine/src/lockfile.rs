// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-device on-disk advisory lock.
//!
//! The lock file at `<device storage>/.lock` holds `"<0|1>.<pid>"`: a
//! locked flag and the pid of the last writer. The pid makes the lock
//! reclaimable: when the recorded holder is no longer a live process, the
//! next actor overwrites the file and takes the lock.
//!
//! Liveness is a snapshot probe (`kill(pid, 0)`); nothing ever blocks
//! waiting on the holder.

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from lock operations
#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock held by live pid {pid}")]
    Held { pid: u32 },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Parsed lock file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockState {
    pub locked: bool,
    pub pid: u32,
}

/// Handle on one device's lock file.
#[derive(Debug, Clone)]
pub struct DeviceLock {
    path: PathBuf,
    self_pid: u32,
}

impl DeviceLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            self_pid: std::process::id(),
        }
    }

    /// Lock handle that reports a chosen pid as "self" (cross-process tests).
    #[doc(hidden)]
    pub fn with_self_pid(path: impl Into<PathBuf>, self_pid: u32) -> Self {
        Self { path: path.into(), self_pid }
    }

    /// Read the lock state; an absent file is created unlocked, owned by
    /// this process.
    pub fn read(&self) -> Result<LockState, LockError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match parse(&content) {
                Some(state) => Ok(state),
                None => {
                    // Garbage in the file is equivalent to a stale lock.
                    tracing::warn!(path = %self.path.display(), content = %content.trim(),
                        "malformed lock file, resetting");
                    self.write(false)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.write(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Take the lock.
    ///
    /// Same-pid re-acquisition is a no-op. A lock held by a dead process is
    /// reclaimed; a lock held by a live foreign process fails with
    /// [`LockError::Held`].
    pub fn acquire(&self) -> Result<(), LockError> {
        let state = self.read()?;
        if state.locked && state.pid != self.self_pid {
            if pid_alive(state.pid) {
                return Err(LockError::Held { pid: state.pid });
            }
            tracing::warn!(path = %self.path.display(), stale_pid = state.pid,
                "reclaiming lock from dead process");
        }
        self.write(true)?;
        Ok(())
    }

    /// Release the lock by overwriting it unlocked.
    ///
    /// Fails when a live foreign process holds it; releasing an unlocked or
    /// stale lock is permitted (paired-call idempotence).
    pub fn release(&self) -> Result<(), LockError> {
        let state = self.read()?;
        if state.locked && state.pid != self.self_pid && pid_alive(state.pid) {
            return Err(LockError::Held { pid: state.pid });
        }
        self.write(false)?;
        Ok(())
    }

    /// Pid of a live foreign holder, if any. A snapshot: the answer can be
    /// stale by the time the caller acts on it.
    pub fn held_by_foreign(&self) -> Result<Option<u32>, LockError> {
        let state = self.read()?;
        if state.locked && state.pid != self.self_pid && pid_alive(state.pid) {
            Ok(Some(state.pid))
        } else {
            Ok(None)
        }
    }

    /// True when this process holds the lock.
    pub fn held_by_self(&self) -> Result<bool, LockError> {
        let state = self.read()?;
        Ok(state.locked && state.pid == self.self_pid)
    }

    fn write(&self, locked: bool) -> Result<LockState, LockError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let state = LockState { locked, pid: self.self_pid };
        std::fs::write(&self.path, format!("{}.{}", u8::from(locked), self.self_pid))?;
        Ok(state)
    }
}

fn parse(content: &str) -> Option<LockState> {
    let (flag, pid) = content.trim().split_once('.')?;
    let locked = match flag {
        "0" => false,
        "1" => true,
        _ => return None,
    };
    Some(LockState { locked, pid: pid.parse().ok()? })
}

/// Snapshot check: does a process with this pid exist?
///
/// Signal 0 probes existence without delivering anything. `EPERM` means the
/// process exists but is not ours, so it is still alive.
pub fn pid_alive(pid: u32) -> bool {
    match kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(test)]
#[path = "lockfile_tests.rs"]
mod tests;
