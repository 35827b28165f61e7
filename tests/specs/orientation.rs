//! Orientation rotation semantics.

use crate::prelude::*;
use devlab_adapters::DeviceDriver;
use devlab_core::Orientation;

#[tokio::test]
async fn left_rotations_wrap_downward() {
    let (_driver, lab) = ios_lab(&[("UDID-E", "iPhone SE", true)], 300_000);
    let device = lab.device("UDID-E").await;
    let token = device.start_session().unwrap();
    assert_eq!(device.snapshot().orientation.index(), 0);

    assert_eq!(device.rotate_left(&token).await.unwrap().index(), 3);
    assert_eq!(device.rotate_left(&token).await.unwrap().index(), 2);
}

#[tokio::test]
async fn four_right_rotations_are_the_identity() {
    let (_driver, lab) = ios_lab(&[("UDID-E", "iPhone SE", true)], 300_000);
    let device = lab.device("UDID-E").await;
    let token = device.start_session().unwrap();

    device.rotate_left(&token).await.unwrap();
    device.rotate_left(&token).await.unwrap();
    let settled = device.snapshot().orientation;

    for _ in 0..4 {
        device.rotate_right(&token).await.unwrap();
    }
    assert_eq!(device.snapshot().orientation, settled);
}

#[tokio::test]
async fn rotate_left_then_right_restores() {
    let (_driver, lab) = ios_lab(&[("UDID-E", "iPhone SE", true)], 300_000);
    let device = lab.device("UDID-E").await;
    let token = device.start_session().unwrap();

    device.rotate_left(&token).await.unwrap();
    device.rotate_right(&token).await.unwrap();
    assert_eq!(device.snapshot().orientation, Orientation::Portrait);
}

#[tokio::test]
async fn rotate_to_reaches_an_absolute_target() {
    let (driver, lab) = ios_lab(&[("UDID-E", "iPhone SE", true)], 300_000);
    let device = lab.device("UDID-E").await;
    let token = device.start_session().unwrap();

    device
        .rotate_to(&token, Orientation::LandscapeRight)
        .await
        .unwrap();
    assert_eq!(device.snapshot().orientation, Orientation::LandscapeRight);
    assert_eq!(
        driver.get_orientation(device.id()).await.unwrap(),
        Orientation::LandscapeRight
    );
}
