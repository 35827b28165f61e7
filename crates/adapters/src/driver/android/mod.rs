// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Android drivers: emulators via the AVD tree + `emulator`/`adb`,
//! hardware via `adb`.

pub mod adb;
pub mod avd;
mod emu;
mod phys;

pub use emu::AndroidEmulatorDriver;
pub use phys::AndroidPhysicalDriver;
