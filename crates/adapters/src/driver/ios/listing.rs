// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsers for `xcrun simctl list devices` and `instruments -s devices`.

use regex::Regex;
use std::sync::OnceLock;

/// One simulator row from `simctl list devices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorRow {
    pub name: String,
    pub udid: String,
    pub runtime: String,
    pub booted: bool,
}

/// One row from `instruments -s devices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentsRow {
    pub name: String,
    pub runtime: String,
    pub udid: String,
    pub simulator: bool,
}

// Patterns are literals; compilation cannot fail.
#[allow(clippy::unwrap_used)]
fn device_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "    iPhone SE (3rd generation) (UDID) (Shutdown)"
    // The name may contain parentheses; the udid anchors the split.
    RE.get_or_init(|| {
        Regex::new(
            r"^\s+(.+) \(([0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12})\) \((\w+)\)",
        )
        .unwrap()
    })
}

#[allow(clippy::unwrap_used)]
fn runtime_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-- (.+) --$").unwrap())
}

#[allow(clippy::unwrap_used)]
fn instruments_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "iPhone 15 (17.0) [UDID] (Simulator)" / "Jo's iPhone (16.4) [udid]"
    RE.get_or_init(|| {
        Regex::new(r"^(.+) \(([\d.]+)\) \[([0-9A-Fa-f-]+)\]( \(Simulator\))?$").unwrap()
    })
}

/// Parse the plain-text `simctl list devices` output into rows.
///
/// Runtime sections marked unavailable are skipped wholesale.
pub fn parse_simulator_list(output: &str) -> Vec<SimulatorRow> {
    let mut rows = Vec::new();
    let mut runtime = String::new();
    let mut skipping = false;
    for line in output.lines() {
        if let Some(caps) = runtime_header().captures(line) {
            let label = caps[1].to_string();
            skipping = label.starts_with("Unavailable");
            runtime = sdk_from_runtime(&label);
            continue;
        }
        if skipping {
            continue;
        }
        if let Some(caps) = device_line().captures(line) {
            rows.push(SimulatorRow {
                name: caps[1].to_string(),
                udid: caps[2].to_uppercase(),
                runtime: runtime.clone(),
                booted: &caps[3] == "Booted",
            });
        }
    }
    rows
}

/// Parse `instruments -s devices` into rows.
///
/// Lines without a runtime (the host Mac) do not match and are dropped.
pub fn parse_instruments_devices(output: &str) -> Vec<InstrumentsRow> {
    output
        .lines()
        .filter_map(|line| {
            let caps = instruments_line().captures(line.trim_end())?;
            Some(InstrumentsRow {
                name: caps[1].to_string(),
                runtime: caps[2].to_string(),
                udid: caps[3].to_uppercase(),
                simulator: caps.get(4).is_some(),
            })
        })
        .collect()
}

/// Strip the platform word from a runtime label: "iOS 17.0" -> "17.0".
fn sdk_from_runtime(label: &str) -> String {
    label.rsplit(' ').next().unwrap_or(label).to_string()
}

#[cfg(test)]
#[path = "listing_tests.rs"]
mod tests;
