//! Single-flight discovery and cache coherency.

use crate::prelude::*;
use devlab_adapters::FakeDriver;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn concurrent_discovers_share_one_walk() {
    let driver = FakeDriver::ios_simulator();
    driver.add_device(ios_spec("UDID-A", "iPhone SE", false));
    driver.add_device(ios_spec("UDID-B", "iPhone 15", true));
    driver.set_discover_delay(Duration::from_millis(50));
    let lab = Arc::new(Lab::with_drivers(vec![driver.clone()], 300_000));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let lab = Arc::clone(&lab);
        handles.push(tokio::spawn(async move {
            lab.runtime
                .discover(false, false)
                .await
                .unwrap()
                .iter()
                .map(|d| d.id().as_str().to_string())
                .collect::<Vec<_>>()
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    // Exactly one subprocess walk; every caller observed the same list.
    assert_eq!(driver.discover_count(), 1);
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(results[0], vec!["UDID-A", "UDID-B"]);
}

#[tokio::test]
async fn fleet_changes_are_visible_after_the_ttl() {
    let driver = FakeDriver::ios_simulator();
    driver.add_device(ios_spec("UDID-A", "iPhone SE", false));
    let lab = Lab::with_drivers(vec![driver.clone()], 300_000);

    assert_eq!(lab.runtime.discover(false, false).await.unwrap().len(), 1);

    driver.add_device(ios_spec("UDID-B", "iPhone 15", false));
    assert_eq!(lab.runtime.discover(false, false).await.unwrap().len(), 2);
}

#[tokio::test]
async fn records_are_refreshed_in_place_across_walks() {
    let driver = FakeDriver::ios_simulator();
    driver.add_device(ios_spec("UDID-A", "iPhone SE", false));
    let lab = Lab::with_drivers(vec![driver.clone()], 300_000);
    let device = lab.device("UDID-A").await;
    assert!(!device.snapshot().state.is_booted());

    // The simulator is booted behind our back; a later walk corrects it.
    driver.set_booted(device.id(), true);
    lab.runtime.discover(false, false).await.unwrap();
    assert!(device.snapshot().state.is_booted());
}

#[tokio::test]
async fn walk_failures_reach_every_concurrent_caller() {
    let driver = FakeDriver::ios_simulator();
    driver.set_discover_delay(Duration::from_millis(50));
    driver.fail_next("discover", "tooling unavailable");
    let lab = Arc::new(Lab::with_drivers(vec![driver.clone()], 300_000));

    let mut handles = Vec::new();
    for _ in 0..3 {
        let lab = Arc::clone(&lab);
        handles.push(tokio::spawn(async move {
            lab.runtime.discover(false, false).await.err().map(|e| e.to_string())
        }));
    }
    for handle in handles {
        let err = handle.await.unwrap().unwrap();
        assert!(err.contains("tooling unavailable"), "got: {err}");
    }
}
