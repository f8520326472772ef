// SPDX-License-Identifier: GPL-3.0-only

//! Capture size selection

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::errors::Error;

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Squared Euclidean distance between two sizes
    pub fn distance_squared(&self, other: &Size) -> i64 {
        let w_diff = self.width as i64 - other.width as i64;
        let h_diff = self.height as i64 - other.height as i64;
        w_diff * w_diff + h_diff * h_diff
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses `WIDTHxHEIGHT`, e.g. `640x480`
impl FromStr for Size {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::config(format!("invalid size '{}', expected WIDTHxHEIGHT", s));
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        let width = w.trim().parse().map_err(|_| invalid())?;
        let height = h.trim().parse().map_err(|_| invalid())?;
        Ok(Self { width, height })
    }
}

/// Pick the supported size closest to `preferred`
///
/// Minimises the squared Euclidean distance over (width, height). On ties
/// the earliest size in `sizes` wins. Returns `None` for an empty list.
pub fn choose_optimal_size(sizes: &[Size], preferred: Size) -> Option<Size> {
    let mut best: Option<(Size, i64)> = None;
    for size in sizes {
        debug!(size = %size, "Available capture size");
        let distance = size.distance_squared(&preferred);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((*size, distance));
        }
    }

    let chosen = best.map(|(size, _)| size);
    if let Some(size) = chosen {
        debug!(size = %size, preferred = %preferred, "Chosen capture size");
    }
    chosen
}
