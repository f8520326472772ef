// SPDX-License-Identifier: GPL-3.0-only

//! yuv2rgba - fixed-point YUV to RGBA frame conversion
//!
//! Converts camera frames in planar, semi-planar and packed YUV layouts to
//! 8-bit RGBA using an integer approximation of the JFIF (BT.601 full range)
//! matrix. The same transform runs on the CPU (rayon) and on the GPU (wgpu
//! compute), producing identical bytes.
//!
//! # Architecture
//!
//! - [`convert`]: the per-pixel transform
//! - [`frame`]: borrowed, validated frame handles and named layouts
//! - [`backends`]: CPU and GPU dispatch behind [`backends::FrameConverter`]
//! - [`shaders`]: the WGSL kernel and its wgpu processor
//! - [`render_context`]: fixed-size context owning the RGBA output buffer
//! - [`pipelines`]: PPG statistics and the async recorder
//! - [`config`]: user configuration
//!
//! # Example
//!
//! ```no_run
//! use yuv2rgba::{BackendType, RenderContext, YuvFrame, YuvLayout};
//!
//! # fn main() -> yuv2rgba::Result<()> {
//! let nv21 = vec![128u8; YuvLayout::NV21.frame_size(640, 480).unwrap()];
//! let frame = YuvFrame::new(&nv21, 640, 480, YuvLayout::NV21)?;
//! let mut ctx = RenderContext::new(640, 480, BackendType::Auto)?;
//! let rgba = ctx.render(&frame)?;
//! assert_eq!(rgba.len(), 640 * 480 * 4);
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod convert;
pub mod errors;
pub mod frame;
pub mod gpu;
pub mod pipelines;
pub mod render_context;
pub mod shaders;

// Re-export commonly used types
pub use backends::{BackendType, FrameConverter, create_converter};
pub use config::Config;
pub use convert::{Rgba, YuvSample, convert, yuv_to_rgba};
pub use errors::{Error, Result};
pub use frame::{Plane, YuvFrame, YuvLayout};
pub use render_context::RenderContext;
