// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_moves_forward() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
    assert!(clock.epoch_ms() > 0);
}

#[test]
fn fake_clock_starts_at_zero_epoch() {
    let clock = FakeClock::new();
    assert_eq!(clock.epoch_ms(), 0);
}

#[test]
fn fake_clock_advance_moves_both_clocks() {
    let clock = FakeClock::new();
    let start = clock.now();
    clock.advance(Duration::from_millis(1500));
    assert_eq!(clock.epoch_ms(), 1500);
    assert_eq!(clock.now() - start, Duration::from_millis(1500));
}

#[test]
fn fake_clock_set_epoch_is_absolute() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_700_000_000_000);
    clock.advance(Duration::from_secs(1));
    assert_eq!(clock.epoch_ms(), 1_700_000_001_000);
}

#[test]
fn fake_clock_clones_share_state() {
    let clock = FakeClock::new();
    let other = clock.clone();
    clock.advance(Duration::from_millis(250));
    assert_eq!(other.epoch_ms(), 250);
}
