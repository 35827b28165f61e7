// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device runtime-state machine.
//!
//! Lifecycle operations never mutate a record's state directly; they apply
//! a [`StateEvent`] and commit the resulting state only on operation
//! success, so a failed operation leaves the record untouched.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Runtime state of a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceState {
    /// Not yet observed by any discovery walk
    #[default]
    Unknown,
    /// Known and powered off
    Shutdown,
    /// Boot issued, not yet responsive
    Booting,
    /// Up and accepting operations
    Booted,
    /// Shutdown issued, not yet complete
    ShuttingDown,
    /// A boot attempt failed; requires explicit recovery
    Errored,
}

/// Transition stimuli accepted by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    /// First discovery observation of this device
    Discovered { booted: bool },
    Boot,
    BootOk,
    BootFail,
    Shutdown,
    ShutdownOk,
    Restart,
    Recover,
    /// Later discovery observation; corrects settled states only
    Refresh { booted: bool },
}

/// Errors from state transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("device in state {from} does not admit {event}")]
    IllegalTransition { from: DeviceState, event: StateEvent },
}

impl DeviceState {
    /// Apply a transition stimulus, returning the next state.
    ///
    /// Every pair not listed is rejected. A `Refresh` observed while a
    /// boot or shutdown is in flight keeps the in-flight state; the
    /// transition already underway owns the outcome.
    pub fn apply(self, event: StateEvent) -> Result<DeviceState, StateError> {
        use DeviceState::*;
        match (self, event) {
            (Unknown, StateEvent::Discovered { booted }) => {
                Ok(if booted { Booted } else { Shutdown })
            }
            (Shutdown, StateEvent::Boot) => Ok(Booting),
            (Booting, StateEvent::BootOk) => Ok(Booted),
            (Booting, StateEvent::BootFail) => Ok(Errored),
            (Booted, StateEvent::Shutdown) => Ok(ShuttingDown),
            (ShuttingDown, StateEvent::ShutdownOk) => Ok(Shutdown),
            (Booted, StateEvent::Restart) => Ok(Booting),
            (Errored, StateEvent::Recover) => Ok(Shutdown),
            (Booting | ShuttingDown, StateEvent::Refresh { .. }) => Ok(self),
            (_, StateEvent::Refresh { booted }) => Ok(if booted { Booted } else { Shutdown }),
            (from, event) => Err(StateError::IllegalTransition { from, event }),
        }
    }

    pub fn is_booted(self) -> bool {
        self == DeviceState::Booted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceState::Unknown => "unknown",
            DeviceState::Shutdown => "shutdown",
            DeviceState::Booting => "booting",
            DeviceState::Booted => "booted",
            DeviceState::ShuttingDown => "shutting-down",
            DeviceState::Errored => "errored",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StateEvent::Discovered { .. } => "discover",
            StateEvent::Boot => "boot",
            StateEvent::BootOk => "boot-ok",
            StateEvent::BootFail => "boot-fail",
            StateEvent::Shutdown => "shutdown",
            StateEvent::ShutdownOk => "shutdown-ok",
            StateEvent::Restart => "restart",
            StateEvent::Recover => "recover",
            StateEvent::Refresh { .. } => "refresh",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
