// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_cover_every_known_driver() {
    let config = Config::default();
    assert_eq!(config.drivers, crate::drivers::KNOWN_DRIVERS);
    assert_eq!(config.device_session_timeout, 300_000);
}

#[test]
fn load_parses_a_full_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("devlab.toml");
    std::fs::write(
        &path,
        "drivers = [\"ios-simulator\"]\ndevice_session_timeout = 60000\n",
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.drivers, vec!["ios-simulator"]);
    assert_eq!(config.device_session_timeout, 60_000);
}

#[test]
fn omitted_fields_fall_back_to_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("devlab.toml");
    std::fs::write(&path, "drivers = [\"android-emulator\"]\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.device_session_timeout, 300_000);
}

#[test]
fn unknown_keys_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("devlab.toml");
    std::fs::write(&path, "driver = [\"ios-simulator\"]\n").unwrap();
    assert!(matches!(
        Config::load(&path).unwrap_err(),
        ControlError::Config(_)
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        Config::load(std::path::Path::new("/nonexistent/devlab.toml")).unwrap_err(),
        ControlError::Io(_)
    ));
}
