// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::process::FakeProcessRunner;

const ADB_DEVICES: &str = "\
List of devices attached
emulator-5554\tdevice
R58M12ABCDE\tdevice
R58M12ABCDE2\toffline
";

fn driver() -> (FakeProcessRunner, AndroidPhysicalDriver<FakeProcessRunner>) {
    let runner = FakeProcessRunner::new();
    (runner.clone(), AndroidPhysicalDriver::new(runner))
}

#[tokio::test]
async fn discover_lists_ready_hardware_only() {
    let (runner, driver) = driver();
    runner.script_stdout(&["adb", "devices"], ADB_DEVICES);
    runner.script_stdout(
        &["adb", "-s", "R58M12ABCDE", "shell", "getprop", "ro.product.device"],
        "a52q\n",
    );
    runner.script_stdout(
        &["adb", "-s", "R58M12ABCDE", "shell", "getprop", "ro.build.version.sdk"],
        "33\n",
    );
    runner.script_stdout(
        &["adb", "-s", "R58M12ABCDE", "shell", "getprop", "sys.boot_completed"],
        "1\n",
    );
    runner.script_stdout(
        &["adb", "-s", "R58M12ABCDE", "shell", "wm", "size"],
        "Physical size: 1080x2400\n",
    );
    runner.script_stdout(
        &["adb", "-s", "R58M12ABCDE", "shell", "wm", "density"],
        "Physical density: 420\n",
    );
    runner.script_stdout(
        &["adb", "-s", "R58M12ABCDE", "shell", "dumpsys", "input"],
        "  SurfaceOrientation: 0\n",
    );

    let specs = driver.discover().await.unwrap();
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].id, "R58M12ABCDE");
    assert_eq!(specs[0].model, "a52q");
    assert_eq!(specs[0].sdk, "33");
    assert_eq!(specs[0].kind, DeviceKind::Physical);
    assert!(specs[0].booted);
    assert_eq!(specs[0].width, 1080);
    assert_eq!(specs[0].orientation, Some(Orientation::Portrait));
}

#[tokio::test]
async fn power_control_is_unsupported() {
    let (_runner, driver) = driver();
    let id = DeviceId::new("R58M12ABCDE");
    assert!(matches!(
        driver.boot(&id).await.unwrap_err(),
        DriverError::Unsupported { op: "boot", .. }
    ));
    assert!(matches!(
        driver.shutdown(&id).await.unwrap_err(),
        DriverError::Unsupported { op: "shutdown", .. }
    ));
}

#[tokio::test]
async fn is_booted_requires_attachment() {
    let (runner, driver) = driver();
    runner.script_stdout(&["adb", "devices"], "List of devices attached\n");
    assert!(!driver.is_booted(&DeviceId::new("R58M12ABCDE")).await.unwrap());
}

#[tokio::test]
async fn app_operations_address_the_serial() {
    let (runner, driver) = driver();
    let id = DeviceId::new("R58M12ABCDE");
    driver.install(&id, "/tmp/app.apk").await.unwrap();
    driver.press_home(&id).await.unwrap();
    assert_eq!(
        runner.run_commands(),
        vec![
            "adb -s R58M12ABCDE install -r /tmp/app.apk",
            "adb -s R58M12ABCDE shell input keyevent 3",
        ]
    );
}
