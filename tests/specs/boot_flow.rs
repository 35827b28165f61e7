//! Happy-path lifecycle: discover, claim, boot, install, shut down, release.

use crate::prelude::*;
use devlab_core::DeviceState;

#[tokio::test]
async fn boot_install_shutdown_round_trip() {
    let (_driver, lab) = ios_lab(&[("UDID-A", "iPhone SE", false)], 300_000);

    // Discovery surfaces the shut-down simulator.
    let devices = lab.runtime.discover(true, false).await.unwrap();
    assert_eq!(devices.len(), 1);
    let device = &devices[0];
    assert_eq!(device.id().as_str(), "UDID-A");
    assert_eq!(device.snapshot().state, DeviceState::Shutdown);

    // Claim and boot without a settle delay.
    let token = device.start_session().unwrap();
    device.boot_with(Some(&token), instant_boot()).await.unwrap();
    assert_eq!(device.snapshot().state, DeviceState::Booted);
    assert_eq!(lab.lock_content("UDID-A"), format!("1.{}", self_pid()));

    // App control against the booted device.
    device.install(&token, "/tmp/app.ipa").await.unwrap();

    // Shutdown returns the device and releases the lock.
    device.shutdown(&token).await.unwrap();
    assert_eq!(device.snapshot().state, DeviceState::Shutdown);
    assert_eq!(lab.lock_content("UDID-A"), format!("0.{}", self_pid()));

    // End of session: token destroyed, device available again.
    device.end_session(&token).unwrap();
    assert!(lab.runtime.sessions().is_empty());
    assert!(device.is_available().unwrap());
}

#[tokio::test]
async fn metrics_are_refreshed_by_boot() {
    let (driver, lab) = ios_lab(&[("UDID-A", "iPhone SE", false)], 300_000);
    let device = lab.device("UDID-A").await;
    driver.set_metrics(
        device.id(),
        devlab_core::DeviceMetrics { width: 1179, height: 2556, density: 3 },
    );

    let token = device.start_session().unwrap();
    device.boot_with(Some(&token), instant_boot()).await.unwrap();

    let record = device.snapshot();
    assert_eq!((record.width, record.height, record.density), (1179, 2556, 3));
}

#[tokio::test]
async fn a_full_cycle_leaves_no_observable_residue() {
    let (_driver, lab) = ios_lab(&[("UDID-A", "iPhone SE", false)], 300_000);
    let device = lab.device("UDID-A").await;
    let before = device.snapshot();

    let token = device.start_session().unwrap();
    device.boot_with(Some(&token), instant_boot()).await.unwrap();
    device.shutdown(&token).await.unwrap();
    device.end_session(&token).unwrap();

    // Width/height/density were refreshed by the boot; everything else is
    // back where it started.
    let after = device.snapshot();
    assert_eq!(after.state, before.state);
    assert_eq!(after.current_session, before.current_session);
    assert_eq!(after.orientation, before.orientation);
    assert_eq!(after.name, before.name);
}
