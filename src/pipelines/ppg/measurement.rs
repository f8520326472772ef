// SPDX-License-Identifier: GPL-3.0-only

//! Measurement duration control

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::constants::PPG_MEASUREMENT_TIME_DEFAULT;

/// Bounds one PPG recording by time or by an explicit stop request
///
/// Clones share the stop flag, so a clone handed to another task can end
/// the measurement.
#[derive(Debug, Clone)]
pub struct Measurement {
    duration: Duration,
    stop_requested: Arc<AtomicBool>,
}

impl Measurement {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Request the measurement to end at the next frame
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// True once `elapsed` exceeds the duration or a stop was requested
    pub fn is_complete(&self, elapsed: Duration) -> bool {
        elapsed > self.duration || self.is_stopped()
    }
}

impl Default for Measurement {
    fn default() -> Self {
        Self::new(PPG_MEASUREMENT_TIME_DEFAULT)
    }
}
