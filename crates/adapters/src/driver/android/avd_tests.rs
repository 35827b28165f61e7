// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn write_avd(home: &Path, stem: &str, config: &str, sibling: &str) {
    let dir = home.join(format!("{stem}.avd"));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.ini"), config).unwrap();
    std::fs::write(home.join(format!("{stem}.ini")), sibling).unwrap();
}

#[test]
fn scan_reads_id_name_sdk_and_model() {
    let tmp = tempfile::tempdir().unwrap();
    write_avd(
        tmp.path(),
        "pixel_7",
        "AvdId=Pixel_7_API_34\navd.ini.displayname=Pixel 7 API 34\nhw.device.name=pixel_7\n",
        "avd.ini.encoding=UTF-8\ntarget=android-34\n",
    );

    let avds = scan_avds(tmp.path()).unwrap();
    assert_eq!(avds.len(), 1);
    assert_eq!(avds[0].id, "Pixel_7_API_34");
    assert_eq!(avds[0].display_name, "Pixel 7 API 34");
    assert_eq!(avds[0].sdk, "34");
    assert_eq!(avds[0].model, "pixel_7");
    assert_eq!(avds[0].dir, tmp.path().join("pixel_7.avd"));
}

#[test]
fn scan_falls_back_to_directory_stem() {
    let tmp = tempfile::tempdir().unwrap();
    write_avd(tmp.path(), "bare", "", "");
    let avds = scan_avds(tmp.path()).unwrap();
    assert_eq!(avds[0].id, "bare");
    assert_eq!(avds[0].display_name, "bare");
    assert_eq!(avds[0].sdk, "");
}

#[test]
fn scan_handles_addon_targets() {
    let tmp = tempfile::tempdir().unwrap();
    write_avd(
        tmp.path(),
        "gapps",
        "AvdId=gapps\n",
        "target=Google Inc.:Google APIs:23\n",
    );
    assert_eq!(scan_avds(tmp.path()).unwrap()[0].sdk, "23");
}

#[test]
fn scan_ignores_non_avd_entries_and_missing_home() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("stray.txt"), "x").unwrap();
    std::fs::create_dir(tmp.path().join("not-an-avd")).unwrap();
    assert!(scan_avds(tmp.path()).unwrap().is_empty());

    assert!(scan_avds(&tmp.path().join("missing")).unwrap().is_empty());
}

#[test]
fn scan_is_sorted_by_id() {
    let tmp = tempfile::tempdir().unwrap();
    write_avd(tmp.path(), "zeta", "AvdId=zeta\n", "target=android-33\n");
    write_avd(tmp.path(), "alpha", "AvdId=alpha\n", "target=android-34\n");
    let ids: Vec<_> = scan_avds(tmp.path()).unwrap().into_iter().map(|a| a.id).collect();
    assert_eq!(ids, vec!["alpha", "zeta"]);
}

#[test]
fn parse_ini_skips_comments_and_blanks() {
    let map = parse_ini("# comment\n; also comment\n\nkey = value\nother=1\n");
    assert_eq!(map.get("key").map(String::as_str), Some("value"));
    assert_eq!(map.get("other").map(String::as_str), Some("1"));
    assert_eq!(map.len(), 2);
}

#[yare::parameterized(
    platform = { "android-34", Some("34") },
    addon    = { "Google Inc.:Google APIs:23", Some("23") },
    garbage  = { "android-tv", None },
    empty    = { "", None },
)]
fn target_parsing(target: &str, expected: Option<&str>) {
    assert_eq!(sdk_from_target(target).as_deref(), expected);
}

#[test]
#[serial]
fn avd_home_prefers_explicit_override() {
    std::env::set_var("ANDROID_AVD_HOME", "/opt/avds");
    let home = avd_home();
    std::env::remove_var("ANDROID_AVD_HOME");
    assert_eq!(home, PathBuf::from("/opt/avds"));
}

#[test]
#[serial]
fn avd_home_falls_back_to_sdk_home() {
    std::env::remove_var("ANDROID_AVD_HOME");
    std::env::set_var("ANDROID_SDK_HOME", "/opt/sdk-home");
    let home = avd_home();
    std::env::remove_var("ANDROID_SDK_HOME");
    assert_eq!(home, PathBuf::from("/opt/sdk-home/.android/avd"));
}
