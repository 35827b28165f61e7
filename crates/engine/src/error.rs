// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the control plane

use crate::discovery::WalkFailure;
use crate::lockfile::LockError;
use devlab_adapters::{DriverError, ProcessError};
use devlab_core::{DeviceId, InstrumentId, StateError};
use thiserror::Error;

/// Errors surfaced by lifecycle and registry operations
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("invalid session")]
    InvalidSession,
    #[error("a session is already active for this device")]
    SessionAlreadyActive,
    #[error("device locked by pid {pid}")]
    DeviceLocked { pid: u32 },
    #[error("device is not booted")]
    DeviceNotBooted,
    #[error("a boot is already in progress; try later")]
    DeviceNotReady,
    #[error("device is already booted")]
    DeviceAlreadyBooted,
    #[error(transparent)]
    State(#[from] StateError),
    #[error("boot timed out after {attempts} probes")]
    BootTimeout { attempts: u32 },
    #[error("unknown device: {0}")]
    UnknownDevice(DeviceId),
    #[error("unknown instrument: {0}")]
    UnknownInstrument(InstrumentId),
    #[error("driver {name} rejected: {reason}")]
    DriverInvalid { name: String, reason: String },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("discovery via {driver} failed: {detail}")]
    DiscoveryFailed { driver: &'static str, detail: String },
    #[error("storage is busy: {reason}")]
    StorageBusy { reason: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LockError> for ControlError {
    fn from(e: LockError) -> Self {
        match e {
            LockError::Held { pid } => ControlError::DeviceLocked { pid },
            LockError::Io(e) => ControlError::Io(e),
        }
    }
}

impl From<WalkFailure> for ControlError {
    fn from(f: WalkFailure) -> Self {
        ControlError::DiscoveryFailed { driver: f.driver, detail: f.detail }
    }
}
