// SPDX-License-Identifier: GPL-3.0-only

//! GPU-accelerated YUV to RGBA conversion
//!
//! A wgpu compute shader running the same fixed-point transform as the CPU
//! path, one invocation per output pixel.

mod processor;

pub use processor::{YUV_TO_RGBA_SHADER, YuvConvertParams, YuvConvertProcessor, YuvConvertResult};
