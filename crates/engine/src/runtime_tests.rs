// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::discovery::WalkTtl;
use devlab_adapters::FakeDriver;
use devlab_core::test_support::{android_spec, sample_spec, spec_with_state};
use devlab_core::{FakeClock, SequentialTokenGen};

struct Fixture {
    _tmp: tempfile::TempDir,
    ios: FakeDriver,
    android: FakeDriver,
    runtime: Runtime<FakeClock, SequentialTokenGen>,
}

fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_700_000_000_000);
    let ios = FakeDriver::ios_simulator();
    let android = FakeDriver::android_emulator();
    let runtime = Runtime::new(
        vec![Arc::new(ios.clone()), Arc::new(android.clone())],
        RuntimeDeps {
            clock: clock.clone(),
            tokens: SequentialTokenGen::new("t"),
            storage: DeviceStorage::new(tmp.path()),
            walk_ttl: WalkTtl::none(),
        },
        300_000,
    );
    Fixture { _tmp: tmp, ios, android, runtime }
}

#[tokio::test]
async fn discover_concatenates_every_driver() {
    let f = fixture();
    f.ios.add_device(sample_spec("UDID-A", "iPhone SE"));
    f.android.add_device(android_spec("Pixel_7_API_34", "Pixel 7", false));

    let devices = f.runtime.discover(false, false).await.unwrap();
    let ids: Vec<_> = devices.iter().map(|d| d.id().as_str().to_string()).collect();
    assert_eq!(ids, vec!["Pixel_7_API_34", "UDID-A"]);
    assert_eq!(f.ios.discover_count(), 1);
    assert_eq!(f.android.discover_count(), 1);
}

#[tokio::test]
async fn discover_only_available_filters_claimed_devices() {
    let f = fixture();
    f.ios.add_device(sample_spec("UDID-A", "iPhone SE"));
    f.ios.add_device(sample_spec("UDID-B", "iPhone 15"));

    let all = f.runtime.discover(false, false).await.unwrap();
    assert_eq!(all.len(), 2);

    let claimed = f
        .runtime
        .get_device_with_id(&DeviceId::new("UDID-A"))
        .unwrap();
    let _token = claimed.start_session().unwrap();

    let available = f.runtime.discover(true, false).await.unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].id(), &DeviceId::new("UDID-B"));
}

#[tokio::test]
async fn list_only_skips_lock_probes_but_honors_sessions() {
    let f = fixture();
    f.ios.add_device(sample_spec("UDID-A", "iPhone SE"));
    f.runtime.discover(false, false).await.unwrap();

    // A foreign lock on disk hides the device from a full walk but not
    // from a cheap listing.
    let storage = DeviceStorage::new(f._tmp.path());
    std::fs::write(storage.lock_path(&DeviceId::new("UDID-A")), "1.1").unwrap();

    assert!(f.runtime.discover(true, false).await.unwrap().is_empty());
    assert_eq!(f.runtime.discover(true, true).await.unwrap().len(), 1);
}

#[tokio::test]
async fn lookups_by_name_are_case_insensitive() {
    let f = fixture();
    f.ios.add_device(sample_spec("UDID-A", "iPhone SE"));
    f.runtime.discover(false, false).await.unwrap();

    assert_eq!(f.runtime.get_devices_with_name("IPHONE se").len(), 1);
    assert!(f.runtime.get_devices_with_name("nexus").is_empty());
}

#[tokio::test]
async fn lookup_by_id_returns_a_live_handle() {
    let f = fixture();
    f.ios.add_device(spec_with_state("UDID-A", "iPhone SE", true));
    f.runtime.discover(false, false).await.unwrap();

    let device = f.runtime.get_device_with_id(&DeviceId::new("UDID-A")).unwrap();
    assert!(device.snapshot().state.is_booted());
    assert!(f.runtime.get_device_with_id(&DeviceId::new("missing")).is_none());
}

#[tokio::test]
async fn handles_from_repeated_lookups_share_state() {
    let f = fixture();
    f.android.add_device(android_spec("Pixel_7_API_34", "Pixel 7", true));
    f.runtime.discover(false, false).await.unwrap();

    let id = DeviceId::new("Pixel_7_API_34");
    let first = f.runtime.get_device_with_id(&id).unwrap();
    let token = first.start_session().unwrap();
    let instrument = first.start_instrument(&token, "perf").await.unwrap();

    // A second lookup sees the same instruments.
    let second = f.runtime.get_device_with_id(&id).unwrap();
    assert_eq!(second.running_instruments(), vec![instrument]);
}

#[tokio::test]
async fn driver_failure_surfaces_typed() {
    let f = fixture();
    f.ios.fail_next("discover", "simctl missing");

    let err = f.runtime.discover(false, false).await.unwrap_err();
    assert!(matches!(err, ControlError::DiscoveryFailed { .. }));
}

#[tokio::test]
async fn from_config_rejects_unknown_drivers() {
    let config = Config {
        drivers: vec!["palm-pilot".to_string()],
        ..Config::default()
    };
    assert!(matches!(
        SystemRuntime::from_config(&config).unwrap_err(),
        ControlError::DriverInvalid { .. }
    ));
}
