// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use DeviceState::*;

#[yare::parameterized(
    discover_off     = { Unknown,      StateEvent::Discovered { booted: false }, Shutdown },
    discover_on      = { Unknown,      StateEvent::Discovered { booted: true },  Booted },
    boot             = { Shutdown,     StateEvent::Boot,       Booting },
    boot_ok          = { Booting,      StateEvent::BootOk,     Booted },
    boot_fail        = { Booting,      StateEvent::BootFail,   Errored },
    shutdown         = { Booted,       StateEvent::Shutdown,   ShuttingDown },
    shutdown_ok      = { ShuttingDown, StateEvent::ShutdownOk, Shutdown },
    restart          = { Booted,       StateEvent::Restart,    Booting },
    recover          = { Errored,      StateEvent::Recover,    Shutdown },
)]
fn admitted(from: DeviceState, event: StateEvent, expected: DeviceState) {
    assert_eq!(from.apply(event).unwrap(), expected);
}

#[yare::parameterized(
    boot_while_booted     = { Booted,   StateEvent::Boot },
    boot_while_booting    = { Booting,  StateEvent::Boot },
    boot_while_errored    = { Errored,  StateEvent::Boot },
    shutdown_while_off    = { Shutdown, StateEvent::Shutdown },
    boot_ok_from_shutdown = { Shutdown, StateEvent::BootOk },
    restart_from_shutdown = { Shutdown, StateEvent::Restart },
    recover_from_booted   = { Booted,   StateEvent::Recover },
    discover_twice        = { Shutdown, StateEvent::Discovered { booted: true } },
)]
fn rejected(from: DeviceState, event: StateEvent) {
    let err = from.apply(event).unwrap_err();
    assert_eq!(err, StateError::IllegalTransition { from, event });
}

#[yare::parameterized(
    corrects_shutdown = { Shutdown, true,  Booted },
    corrects_booted   = { Booted,   false, Shutdown },
    corrects_errored  = { Errored,  false, Shutdown },
    corrects_unknown  = { Unknown,  true,  Booted },
)]
fn refresh_corrects_settled_states(from: DeviceState, booted: bool, expected: DeviceState) {
    assert_eq!(from.apply(StateEvent::Refresh { booted }).unwrap(), expected);
}

#[yare::parameterized(
    mid_boot     = { Booting },
    mid_shutdown = { ShuttingDown },
)]
fn refresh_keeps_in_flight_transitions(from: DeviceState) {
    assert_eq!(from.apply(StateEvent::Refresh { booted: false }).unwrap(), from);
    assert_eq!(from.apply(StateEvent::Refresh { booted: true }).unwrap(), from);
}

#[test]
fn errored_blocks_operations_until_recovery() {
    // A timed-out boot strands the device in Errored; only Recover or a
    // discovery Refresh gets it out.
    let state = Booting.apply(StateEvent::BootFail).unwrap();
    assert_eq!(state, Errored);
    assert!(state.apply(StateEvent::Boot).is_err());
    assert!(state.apply(StateEvent::Shutdown).is_err());
    assert_eq!(state.apply(StateEvent::Recover).unwrap(), Shutdown);
}

#[test]
fn display_labels() {
    assert_eq!(Booted.to_string(), "booted");
    assert_eq!(ShuttingDown.to_string(), "shutting-down");
    assert_eq!(StateEvent::BootOk.to_string(), "boot-ok");
}
