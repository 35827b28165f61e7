//! Cross-process lock behavior, simulated through lock files on disk.

use crate::prelude::*;
use devlab_engine::ControlError;

// Beyond the Linux pid range: guaranteed dead.
const DEAD_PID: u32 = 4_194_304;

#[tokio::test]
async fn foreign_live_lock_blocks_session_start() {
    let (_driver, lab) = ios_lab(&[("UDID-B", "iPhone 15", false)], 300_000);
    let device = lab.device("UDID-B").await;

    // Another live process (pid 1) holds the device.
    lab.write_lock("UDID-B", "1.1");

    assert!(matches!(
        device.start_session().unwrap_err(),
        ControlError::DeviceLocked { pid: 1 }
    ));
}

#[tokio::test]
async fn stale_lock_of_a_dead_holder_is_reclaimed() {
    let (_driver, lab) = ios_lab(&[("UDID-B", "iPhone 15", false)], 300_000);
    let device = lab.device("UDID-B").await;

    // The previous holder died without releasing.
    lab.write_lock("UDID-B", &format!("1.{DEAD_PID}"));

    device.start_session().unwrap();
    assert_eq!(lab.lock_content("UDID-B"), format!("1.{}", self_pid()));
}

#[tokio::test]
async fn foreign_lock_blocks_boot_too() {
    let (_driver, lab) = ios_lab(&[("UDID-B", "iPhone 15", false)], 300_000);
    let device = lab.device("UDID-B").await;
    lab.write_lock("UDID-B", "1.1");

    assert!(matches!(
        device.boot_with(None, instant_boot()).await.unwrap_err(),
        ControlError::DeviceLocked { pid: 1 }
    ));
}

#[tokio::test]
async fn locked_devices_are_not_available() {
    let (_driver, lab) = ios_lab(&[("UDID-B", "iPhone 15", false)], 300_000);
    let device = lab.device("UDID-B").await;

    lab.write_lock("UDID-B", "1.1");
    assert!(!device.is_available().unwrap());

    lab.write_lock("UDID-B", &format!("1.{DEAD_PID}"));
    assert!(device.is_available().unwrap());
}

#[tokio::test]
async fn purge_respects_any_live_holder() {
    let (_driver, lab) = ios_lab(&[("UDID-B", "iPhone 15", false)], 300_000);
    let device = lab.device("UDID-B").await;

    lab.write_lock("UDID-B", "1.1");
    assert!(matches!(
        device.purge_local_storage().unwrap_err(),
        ControlError::StorageBusy { .. }
    ));

    lab.write_lock("UDID-B", &format!("1.{DEAD_PID}"));
    device.purge_local_storage().unwrap();
}
