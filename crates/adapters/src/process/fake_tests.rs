// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn unscripted_run_succeeds_empty() {
    let runner = FakeProcessRunner::new();
    let out = runner
        .run(&argv(&["adb", "devices"]), &[], Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(out, RunOutput::default());
    assert_eq!(runner.run_commands(), vec!["adb devices"]);
}

#[tokio::test]
async fn scripted_responses_drain_in_order() {
    let runner = FakeProcessRunner::new();
    runner.script_stdout(&["adb", "get-state"], "offline");
    runner.script_stdout(&["adb", "get-state"], "device");

    let first = runner
        .run(&argv(&["adb", "get-state"]), &[], Duration::from_secs(1))
        .await
        .unwrap();
    let second = runner
        .run(&argv(&["adb", "get-state"]), &[], Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(first.stdout, "offline");
    assert_eq!(second.stdout, "device");
}

#[tokio::test]
async fn scripted_error_is_returned() {
    let runner = FakeProcessRunner::new();
    runner.script(
        &["xcrun", "simctl", "boot", "X"],
        Err(ProcessError::SpawnFailed {
            command: "xcrun".to_string(),
            detail: "not found".to_string(),
        }),
    );
    let err = runner
        .run(&argv(&["xcrun", "simctl", "boot", "X"]), &[], Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::SpawnFailed { .. }));
}

#[tokio::test]
async fn spawn_hands_out_controllable_children() {
    let runner = FakeProcessRunner::new();
    let handle = runner
        .spawn(&argv(&["emulator", "-avd", "pixel"]), &[], None)
        .await
        .unwrap();

    let children = runner.spawned();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].pid(), handle.pid());

    handle.signal(ProcessSignal::Interrupt).unwrap();
    assert_eq!(children[0].signals(), vec![ProcessSignal::Interrupt]);

    children[0].set_exit(Some(0));
    assert_eq!(handle.wait().await, Some(0));
}

#[tokio::test]
async fn wait_blocks_until_exit_is_set() {
    let child = Arc::new(FakeChild::new(1));
    let waiter = {
        let child = Arc::clone(&child);
        tokio::spawn(async move { child.wait().await })
    };
    tokio::task::yield_now().await;
    assert!(!waiter.is_finished());
    child.set_exit(Some(3));
    assert_eq!(waiter.await.unwrap(), Some(3));
}
