// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! devlab-engine: the device lifecycle and session coordinator.
//!
//! This crate carries the control plane proper: the inter-process lock
//! discipline, the session registry, single-flight discovery, and the
//! guarded lifecycle operations. OS specifics live behind the driver trait
//! in `devlab-adapters`.

pub mod config;
pub mod discovery;
pub mod drivers;
pub mod error;
pub mod lifecycle;
pub mod lockfile;
pub mod sessions;
pub mod singleflight;
pub mod table;

mod runtime;

pub use config::Config;
pub use discovery::{DiscoveryCoordinator, WalkFailure, WalkTtl};
pub use error::ControlError;
pub use lifecycle::{BootOptions, Device};
pub use lockfile::{DeviceLock, LockError, LockState};
pub use runtime::{Runtime, RuntimeDeps, SystemRuntime};
pub use sessions::SessionRegistry;
pub use singleflight::SingleFlight;
pub use table::{DeviceCell, DeviceTable};
