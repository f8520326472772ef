// SPDX-License-Identifier: GPL-3.0-only

//! Per-pixel YUV to RGBA transform
//!
//! This is the kernel every dispatcher runs: sample Y, U and V, apply the
//! fixed-point JFIF matrix in `i32`, clamp each channel and force opaque
//! alpha. It holds no state and is safe to call from any number of threads.

use crate::constants::{OPAQUE_ALPHA, fixed_point as fp};
use crate::frame::YuvFrame;

/// One luma/chroma sample triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct YuvSample {
    pub y: u8,
    pub u: u8,
    pub v: u8,
}

impl YuvSample {
    pub const fn new(y: u8, u: u8, v: u8) -> Self {
        Self { y, u, v }
    }
}

/// 8-bit RGBA pixel
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Rgba> for [u8; 4] {
    fn from(px: Rgba) -> Self {
        px.to_array()
    }
}

/// Unclamped fixed-point RGB, may be negative or above 255
#[inline]
pub fn yuv_to_rgb_unclamped(sample: YuvSample) -> [i32; 3] {
    let y = sample.y as i32;
    let u = sample.u as i32;
    let v = sample.v as i32;

    let r = y + v * fp::R_V_MUL / fp::R_V_DIV - fp::R_OFFSET;
    let g = y - u * fp::G_U_MUL / fp::G_DIV + fp::G_U_OFFSET - v * fp::G_V_MUL / fp::G_DIV
        + fp::G_V_OFFSET;
    let b = y + u * fp::B_U_MUL / fp::B_U_DIV - fp::B_OFFSET;

    [r, g, b]
}

/// Convert one sample to an opaque RGBA pixel
///
/// Saturated chroma does not imply saturated green: (255, 255, 255) gives
/// R = B = 255 but G = 118.
#[inline]
pub fn yuv_to_rgba(sample: YuvSample) -> Rgba {
    let [r, g, b] = yuv_to_rgb_unclamped(sample);
    Rgba {
        r: r.clamp(0, 255) as u8,
        g: g.clamp(0, 255) as u8,
        b: b.clamp(0, 255) as u8,
        a: OPAQUE_ALPHA,
    }
}

/// Convert the frame pixel at `(x, y)`
///
/// `(x, y)` must be inside the frame; see [`YuvFrame::sample`].
#[inline]
pub fn convert(frame: &YuvFrame<'_>, x: u32, y: u32) -> Rgba {
    yuv_to_rgba(frame.sample(x, y))
}
