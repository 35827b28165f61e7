// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Screen orientation as a quarter-turn index.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Device screen orientation.
///
/// Indexes 0..=3 map to portrait, landscape-right, portrait-upside-down,
/// landscape-left. Rotation wraps in both directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    LandscapeRight,
    PortraitUpsideDown,
    LandscapeLeft,
}

impl Orientation {
    pub fn index(self) -> u8 {
        match self {
            Orientation::Portrait => 0,
            Orientation::LandscapeRight => 1,
            Orientation::PortraitUpsideDown => 2,
            Orientation::LandscapeLeft => 3,
        }
    }

    /// Map an index to an orientation, wrapping mod 4.
    pub fn from_index(i: u8) -> Self {
        match i % 4 {
            0 => Orientation::Portrait,
            1 => Orientation::LandscapeRight,
            2 => Orientation::PortraitUpsideDown,
            _ => Orientation::LandscapeLeft,
        }
    }

    /// Counter-clockwise quarter turn (0 wraps to 3).
    pub fn rotated_left(self) -> Self {
        Self::from_index(self.index().wrapping_add(3))
    }

    /// Clockwise quarter turn (3 wraps to 0).
    pub fn rotated_right(self) -> Self {
        Self::from_index(self.index().wrapping_add(1))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::LandscapeRight => "landscape-right",
            Orientation::PortraitUpsideDown => "portrait-upside-down",
            Orientation::LandscapeLeft => "landscape-left",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "orientation_tests.rs"]
mod tests;
