// SPDX-License-Identifier: GPL-3.0-only
//! Compute shaders and the shared GPU processor plumbing

mod gpu_processor;
pub mod yuv_convert;

pub use gpu_processor::{CachedDimensions, compute_dispatch_size, read_buffer_with};
pub use yuv_convert::{YuvConvertProcessor, YuvConvertResult};
