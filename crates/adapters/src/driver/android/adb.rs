// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared adb plumbing: argv builders, output parsers, and the per-serial
//! operations common to emulators and hardware.

use crate::driver::DriverError;
use crate::process::{ProcessError, ProcessRunner, RunOutput};
use crate::subprocess::{ADB_TIMEOUT, DEVICE_COMMAND_TIMEOUT};
use devlab_core::{DeviceMetrics, Orientation};

/// Launch output marker promoted to a typed error.
const NO_ACTIVITIES_MARKER: &str = "No activities found";

/// One row of `adb devices` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdbRow {
    pub serial: String,
    pub state: String,
}

impl AdbRow {
    pub fn is_emulator(&self) -> bool {
        self.serial.starts_with("emulator-")
    }

    /// Console port of an emulator serial (`emulator-5554` -> 5554).
    pub fn port(&self) -> Option<u16> {
        self.serial.strip_prefix("emulator-")?.parse().ok()
    }

    pub fn is_ready(&self) -> bool {
        self.state == "device"
    }
}

/// Parse `adb devices` output, skipping the banner and empty lines.
pub fn parse_devices(output: &str) -> Vec<AdbRow> {
    output
        .lines()
        .skip_while(|l| !l.starts_with("List of devices"))
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?;
            let state = parts.next()?;
            Some(AdbRow {
                serial: serial.to_string(),
                state: state.to_string(),
            })
        })
        .collect()
}

/// Parse `wm size` output: prefers an override size over the physical one.
pub fn parse_wm_size(output: &str) -> Option<(u32, u32)> {
    let mut physical = None;
    for line in output.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let Some((w, h)) = value.trim().split_once('x') else {
            continue;
        };
        let (Ok(w), Ok(h)) = (w.parse::<u32>(), h.parse::<u32>()) else {
            continue;
        };
        match label.trim() {
            "Override size" => return Some((w, h)),
            "Physical size" => physical = Some((w, h)),
            _ => {}
        }
    }
    physical
}

/// Parse `wm density` output: prefers an override density over the physical
/// one.
pub fn parse_wm_density(output: &str) -> Option<u32> {
    let mut physical = None;
    for line in output.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let Ok(density) = value.trim().parse::<u32>() else {
            continue;
        };
        match label.trim() {
            "Override density" => return Some(density),
            "Physical density" => physical = Some(density),
            _ => {}
        }
    }
    physical
}

/// Scrape `SurfaceOrientation: N` out of `dumpsys input` output.
pub fn parse_surface_orientation(output: &str) -> Option<Orientation> {
    output.lines().find_map(|line| {
        let trimmed = line.trim();
        let value = trimmed.strip_prefix("SurfaceOrientation:")?;
        value.trim().parse::<u8>().ok().map(Orientation::from_index)
    })
}

pub fn adb_argv(serial: &str, args: &[&str]) -> Vec<String> {
    let mut argv = vec!["adb".to_string(), "-s".to_string(), serial.to_string()];
    argv.extend(args.iter().map(|s| s.to_string()));
    argv
}

/// List connected devices.
pub async fn devices<R: ProcessRunner>(runner: &R) -> Result<Vec<AdbRow>, DriverError> {
    let argv = vec!["adb".to_string(), "devices".to_string()];
    let out = runner.run_checked(&argv, &[], ADB_TIMEOUT).await?;
    Ok(parse_devices(&out.stdout))
}

pub async fn shell<R: ProcessRunner>(
    runner: &R,
    serial: &str,
    args: &[&str],
) -> Result<RunOutput, DriverError> {
    let mut full = vec!["shell"];
    full.extend_from_slice(args);
    Ok(runner
        .run_checked(&adb_argv(serial, &full), &[], ADB_TIMEOUT)
        .await?)
}

pub async fn getprop<R: ProcessRunner>(
    runner: &R,
    serial: &str,
    prop: &str,
) -> Result<String, DriverError> {
    let out = shell(runner, serial, &["getprop", prop]).await?;
    Ok(out.stdout.trim().to_string())
}

pub async fn boot_completed<R: ProcessRunner>(
    runner: &R,
    serial: &str,
) -> Result<bool, DriverError> {
    Ok(getprop(runner, serial, "sys.boot_completed").await? == "1")
}

pub async fn read_metrics<R: ProcessRunner>(
    runner: &R,
    serial: &str,
) -> Result<DeviceMetrics, DriverError> {
    let size = shell(runner, serial, &["wm", "size"]).await?;
    let density = shell(runner, serial, &["wm", "density"]).await?;
    let (width, height) = parse_wm_size(&size.stdout).ok_or(DriverError::ParseFailed {
        tool: "wm size",
        detail: size.stdout.trim().to_string(),
    })?;
    let density = parse_wm_density(&density.stdout).ok_or(DriverError::ParseFailed {
        tool: "wm density",
        detail: density.stdout.trim().to_string(),
    })?;
    Ok(DeviceMetrics { width, height, density })
}

pub async fn install<R: ProcessRunner>(
    runner: &R,
    serial: &str,
    apk_path: &str,
) -> Result<(), DriverError> {
    runner
        .run_checked(
            &adb_argv(serial, &["install", "-r", apk_path]),
            &[],
            DEVICE_COMMAND_TIMEOUT,
        )
        .await?;
    Ok(())
}

pub async fn uninstall<R: ProcessRunner>(
    runner: &R,
    serial: &str,
    package: &str,
) -> Result<(), DriverError> {
    runner
        .run_checked(
            &adb_argv(serial, &["uninstall", package]),
            &[],
            DEVICE_COMMAND_TIMEOUT,
        )
        .await?;
    Ok(())
}

/// Launch the package's default activity via monkey.
///
/// A "no activities found" marker in the output means the package is not
/// launchable and is promoted to [`DriverError::LaunchFailed`].
pub async fn launch<R: ProcessRunner>(
    runner: &R,
    serial: &str,
    package: &str,
) -> Result<(), DriverError> {
    let result = shell(
        runner,
        serial,
        &["monkey", "-p", package, "-c", "android.intent.category.LAUNCHER", "1"],
    )
    .await;
    match result {
        Ok(out) if out.stdout.contains(NO_ACTIVITIES_MARKER) => Err(DriverError::LaunchFailed {
            detail: out.stdout.trim().to_string(),
        }),
        Ok(_) => Ok(()),
        Err(DriverError::Process(ProcessError::NonZeroExit { stderr, .. }))
            if stderr.contains(NO_ACTIVITIES_MARKER) =>
        {
            Err(DriverError::LaunchFailed { detail: stderr })
        }
        Err(e) => Err(e),
    }
}

pub async fn get_orientation<R: ProcessRunner>(
    runner: &R,
    serial: &str,
) -> Result<Orientation, DriverError> {
    let out = shell(runner, serial, &["dumpsys", "input"]).await?;
    parse_surface_orientation(&out.stdout).ok_or(DriverError::ParseFailed {
        tool: "dumpsys input",
        detail: "no SurfaceOrientation line".to_string(),
    })
}

pub async fn set_orientation<R: ProcessRunner>(
    runner: &R,
    serial: &str,
    target: Orientation,
) -> Result<(), DriverError> {
    // Pin rotation before setting it, otherwise the sensor wins it back.
    shell(
        runner,
        serial,
        &["settings", "put", "system", "accelerometer_rotation", "0"],
    )
    .await?;
    shell(
        runner,
        serial,
        &[
            "settings",
            "put",
            "system",
            "user_rotation",
            &target.index().to_string(),
        ],
    )
    .await?;
    Ok(())
}

pub async fn key_event<R: ProcessRunner>(
    runner: &R,
    serial: &str,
    code: u32,
) -> Result<(), DriverError> {
    shell(runner, serial, &["input", "keyevent", &code.to_string()]).await?;
    Ok(())
}

#[cfg(test)]
#[path = "adb_tests.rs"]
mod tests;
