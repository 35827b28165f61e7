//! Session expiry and authorization behavior.

use crate::prelude::*;
use devlab_core::SessionToken;
use devlab_engine::ControlError;
use std::time::Duration;

#[tokio::test]
async fn expired_session_cannot_authorize_operations() {
    let (_driver, lab) = ios_lab(&[("UDID-A", "iPhone SE", true)], 100);
    let device = lab.device("UDID-A").await;
    let token = device.start_session().unwrap();

    lab.clock.advance(Duration::from_millis(150));

    let err = device.install(&token, "/tmp/app.ipa").await.unwrap_err();
    assert!(matches!(err, ControlError::InvalidSession));
    // The stale session is destroyed, never renewed.
    assert!(lab.runtime.sessions().is_empty());
}

#[tokio::test]
async fn session_used_within_ttl_stays_alive() {
    let (_driver, lab) = ios_lab(&[("UDID-A", "iPhone SE", true)], 100);
    let device = lab.device("UDID-A").await;
    let token = device.start_session().unwrap();

    // Each use refreshes the window.
    for _ in 0..5 {
        lab.clock.advance(Duration::from_millis(80));
        device.install(&token, "/tmp/app.ipa").await.unwrap();
    }
}

#[tokio::test]
async fn bogus_token_is_rejected_with_no_state_change() {
    let (driver, lab) = ios_lab(&[("UDID-A", "iPhone SE", true)], 300_000);
    let device = lab.device("UDID-A").await;
    let _token = device.start_session().unwrap();
    let before = device.snapshot();
    let calls_before = driver.calls().len();

    for result in [
        device.install(&SessionToken::new("bogus"), "/tmp/app.ipa").await,
        device.launch(&SessionToken::new("bogus"), "com.example").await,
        device.shutdown(&SessionToken::new("bogus")).await,
    ] {
        assert!(matches!(result.unwrap_err(), ControlError::InvalidSession));
    }
    assert_eq!(device.snapshot(), before);
    assert_eq!(driver.calls().len(), calls_before);
}

#[tokio::test]
async fn at_most_one_live_session_per_device() {
    let (_driver, lab) = ios_lab(
        &[("UDID-A", "iPhone SE", true), ("UDID-B", "iPhone 15", true)],
        300_000,
    );
    let a = lab.device("UDID-A").await;
    let b = lab.device("UDID-B").await;

    let token_a = a.start_session().unwrap();
    assert!(matches!(
        a.start_session().unwrap_err(),
        ControlError::SessionAlreadyActive
    ));

    // Other devices are unaffected, and releasing frees the slot.
    let token_b = b.start_session().unwrap();
    assert_ne!(token_a, token_b);
    a.end_session(&token_a).unwrap();
    a.start_session().unwrap();
}

#[tokio::test]
async fn expiry_boundary_is_exact() {
    let (_driver, lab) = ios_lab(&[("UDID-A", "iPhone SE", true)], 100);
    let device = lab.device("UDID-A").await;
    let token = device.start_session().unwrap();

    lab.clock.advance(Duration::from_millis(99));
    device.install(&token, "/tmp/app.ipa").await.unwrap();

    lab.clock.advance(Duration::from_millis(100));
    assert!(matches!(
        device.install(&token, "/tmp/app.ipa").await.unwrap_err(),
        ControlError::InvalidSession
    ));
}
