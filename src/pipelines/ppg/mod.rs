// SPDX-License-Identifier: GPL-3.0-only

//! Photoplethysmography (PPG) from converted frames
//!
//! Each frame of a fingertip video is converted to RGBA and reduced to its
//! mean red, green and blue values. The stream of means over a measurement
//! window is the PPG signal.
//!
//! - [`FrameStats`]: mean colour of one RGBA frame
//! - [`PpgSample`]: timestamped record emitted per frame
//! - [`choose_optimal_size`]: capture size closest to the preferred one
//! - [`Measurement`]: duration and stop control
//! - [`PpgRecorder`]: async frame → sample pipeline

mod measurement;
mod recorder;
mod sample;
mod size;
mod stats;

pub use measurement::Measurement;
pub use recorder::{PpgRecorder, RecordingEnd, RecordingSummary, TimedFrame};
pub use sample::{PpgSample, now_millis};
pub use size::{Size, choose_optimal_size};
pub use stats::FrameStats;
