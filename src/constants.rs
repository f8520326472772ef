// SPDX-License-Identifier: GPL-3.0-only

//! Conversion coefficients and application defaults

use std::time::Duration;

/// Fixed-point JFIF (BT.601 full range) coefficients
///
/// Each term is `channel * MUL / DIV` evaluated in `i32` with truncating
/// division. The constant offsets fold in the `- 128` chroma bias:
///
/// ```text
/// R = Y + 1.402   * (V - 128)
/// G = Y - 0.34414 * (U - 128) - 0.71414 * (V - 128)
/// B = Y + 1.772   * (U - 128)
/// ```
///
/// The WGSL kernel in `shaders/yuv_convert/yuv_to_rgba.wgsl` repeats these
/// numbers and must be kept in sync.
pub mod fixed_point {
    /// 1.402 ≈ 1436 / 1024
    pub const R_V_MUL: i32 = 1436;
    pub const R_V_DIV: i32 = 1024;
    pub const R_OFFSET: i32 = 179;

    /// 46549 / 131072 ≈ 0.3551, above the JFIF 0.34414 that `G_U_OFFSET`
    /// is derived from. Existing RGBA output depends on this exact value.
    pub const G_U_MUL: i32 = 46549;
    /// 0.71414 ≈ 93604 / 131072
    pub const G_V_MUL: i32 = 93604;
    pub const G_DIV: i32 = 131072;
    pub const G_U_OFFSET: i32 = 44;
    pub const G_V_OFFSET: i32 = 91;

    /// 1.772 ≈ 1814 / 1024
    pub const B_U_MUL: i32 = 1814;
    pub const B_U_DIV: i32 = 1024;
    pub const B_OFFSET: i32 = 227;
}

/// Alpha written for every converted pixel
pub const OPAQUE_ALPHA: u8 = 255;

/// Bytes per RGBA output pixel
pub const RGBA_BYTES_PER_PIXEL: usize = 4;

/// Compute shader workgroup edge (16x16 invocations)
pub const WORKGROUP_SIZE: u32 = 16;

/// Default PPG measurement length
pub const PPG_MEASUREMENT_TIME_DEFAULT: Duration = Duration::from_secs(60);

/// Default preferred capture width for PPG measurements
pub const PPG_MEASUREMENT_WIDTH_DEFAULT: u32 = 200;

/// Default preferred capture height for PPG measurements
pub const PPG_MEASUREMENT_HEIGHT_DEFAULT: u32 = 200;

/// Frames buffered between the reader and the converter
pub const FRAME_CHANNEL_CAPACITY_DEFAULT: usize = 4;

/// Frame rate assumed for recorded streams without timing information
pub const RECORDED_FPS_DEFAULT: u32 = 30;
