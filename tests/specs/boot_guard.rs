//! Boot concurrency: one boot per device id at a time.

use crate::prelude::*;
use devlab_adapters::DriverCall;
use devlab_engine::{BootOptions, ControlError};
use std::time::Duration;

#[tokio::test]
async fn overlapping_boot_fails_fast_without_a_second_spawn() {
    let (driver, lab) = ios_lab(&[("UDID-C", "iPhone SE", false)], 300_000);
    let device = lab.device("UDID-C").await;

    // First boot needs a few probes to come up.
    driver.set_polls_until_ready(device.id(), 3);
    let slow = BootOptions {
        attempts: 10,
        poll_interval: Duration::from_millis(30),
        settle_delay: Duration::ZERO,
    };

    let first = {
        let device = device.clone();
        tokio::spawn(async move { device.boot_with(None, slow).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    // The overlapping caller is told to come back, immediately.
    let err = device.boot_with(None, instant_boot()).await.unwrap_err();
    assert!(matches!(err, ControlError::DeviceNotReady));

    first.await.unwrap().unwrap();
    assert!(device.snapshot().state.is_booted());

    let boots = driver
        .calls()
        .into_iter()
        .filter(|c| matches!(c, DriverCall::Boot { .. }))
        .count();
    assert_eq!(boots, 1);
}

#[tokio::test]
async fn devices_boot_independently() {
    let (driver, lab) = ios_lab(
        &[("UDID-C", "iPhone SE", false), ("UDID-D", "iPhone 15", false)],
        300_000,
    );
    let c = lab.device("UDID-C").await;
    let d = lab.device("UDID-D").await;
    driver.set_polls_until_ready(c.id(), 2);

    let slow = BootOptions {
        attempts: 10,
        poll_interval: Duration::from_millis(30),
        settle_delay: Duration::ZERO,
    };
    let first = {
        let c = c.clone();
        tokio::spawn(async move { c.boot_with(None, slow).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    // A different device boots while the first is still coming up.
    d.boot_with(None, instant_boot()).await.unwrap();
    first.await.unwrap().unwrap();

    assert!(c.snapshot().state.is_booted());
    assert!(d.snapshot().state.is_booted());
}

#[tokio::test]
async fn timed_out_boot_strands_the_device_in_errored() {
    let (driver, lab) = ios_lab(&[("UDID-C", "iPhone SE", false)], 300_000);
    let device = lab.device("UDID-C").await;
    driver.set_polls_until_ready(device.id(), 100);

    let err = device
        .boot_with(None, BootOptions { attempts: 2, ..instant_boot() })
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::BootTimeout { attempts: 2 }));
    assert_eq!(device.snapshot().state, devlab_core::DeviceState::Errored);

    // Subsequent lifecycle operations are refused until recovery.
    assert!(matches!(
        device.boot_with(None, instant_boot()).await.unwrap_err(),
        ControlError::State(_)
    ));
}
