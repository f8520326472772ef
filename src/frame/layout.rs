// SPDX-License-Identifier: GPL-3.0-only

//! Named YUV memory layouts
//!
//! Each layout describes how the Y, U and V planes are arranged inside one
//! contiguous frame buffer, and how far chroma is subsampled.

use std::fmt;
use std::str::FromStr;

use crate::errors::Error;

/// Position of one plane inside a contiguous buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneSpec {
    pub offset: usize,
    pub row_stride: usize,
    pub pixel_stride: usize,
}

impl PlaneSpec {
    const fn new(offset: usize, row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            offset,
            row_stride,
            pixel_stride,
        }
    }
}

/// Plane arrangement for a layout at a given size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutPlanes {
    pub y: PlaneSpec,
    pub u: PlaneSpec,
    pub v: PlaneSpec,
    /// log2 of horizontal chroma subsampling
    pub chroma_shift_x: u32,
    /// log2 of vertical chroma subsampling
    pub chroma_shift_y: u32,
}

/// Supported YUV layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YuvLayout {
    /// Planar 4:2:0: Y plane, then U, then V
    I420,
    /// Planar 4:2:0: Y plane, then V, then U
    YV12,
    /// Semi-planar 4:2:0: Y plane, then interleaved UV
    NV12,
    /// Semi-planar 4:2:0: Y plane, then interleaved VU (Android camera default)
    NV21,
    /// Packed 4:2:2: Y0 U Y1 V
    YUYV,
    /// Packed 4:2:2: U Y0 V Y1
    UYVY,
}

impl YuvLayout {
    pub const ALL: [YuvLayout; 6] = [
        YuvLayout::I420,
        YuvLayout::YV12,
        YuvLayout::NV12,
        YuvLayout::NV21,
        YuvLayout::YUYV,
        YuvLayout::UYVY,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            YuvLayout::I420 => "I420",
            YuvLayout::YV12 => "YV12",
            YuvLayout::NV12 => "NV12",
            YuvLayout::NV21 => "NV21",
            YuvLayout::YUYV => "YUYV",
            YuvLayout::UYVY => "UYVY",
        }
    }

    /// Packed layouts interleave luma and chroma in one plane
    pub fn is_packed(&self) -> bool {
        matches!(self, YuvLayout::YUYV | YuvLayout::UYVY)
    }

    /// Bytes occupied by one frame of this layout
    ///
    /// `None` when the size does not fit in `usize`.
    pub fn frame_size(&self, width: u32, height: u32) -> Option<usize> {
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
        let luma = w.checked_mul(h)?;
        if self.is_packed() {
            luma.checked_mul(2)
        } else {
            luma.checked_add(cw.checked_mul(ch)?.checked_mul(2)?)
        }
    }

    /// Plane offsets and strides for a frame of the given size
    ///
    /// `None` when an offset or stride does not fit in `usize`.
    pub fn planes(&self, width: u32, height: u32) -> Option<LayoutPlanes> {
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
        let luma = w.checked_mul(h)?;
        let second = luma.checked_add(cw.checked_mul(ch)?)?;
        let luma_next = luma.checked_add(1)?;
        let chroma_row = cw.checked_mul(2)?;
        let packed_row = w.checked_mul(2)?;

        let planar = |u_first: bool| {
            let (first, second) = (luma, second);
            let (u, v) = if u_first {
                (first, second)
            } else {
                (second, first)
            };
            LayoutPlanes {
                y: PlaneSpec::new(0, w, 1),
                u: PlaneSpec::new(u, cw, 1),
                v: PlaneSpec::new(v, cw, 1),
                chroma_shift_x: 1,
                chroma_shift_y: 1,
            }
        };

        let semi_planar = |u_first: bool| {
            let (u, v) = if u_first {
                (luma, luma_next)
            } else {
                (luma_next, luma)
            };
            LayoutPlanes {
                y: PlaneSpec::new(0, w, 1),
                u: PlaneSpec::new(u, chroma_row, 2),
                v: PlaneSpec::new(v, chroma_row, 2),
                chroma_shift_x: 1,
                chroma_shift_y: 1,
            }
        };

        // Packed rows are 2 bytes per pixel; each 4-byte group holds 2 pixels
        let packed = |y: usize, u: usize, v: usize| LayoutPlanes {
            y: PlaneSpec::new(y, packed_row, 2),
            u: PlaneSpec::new(u, packed_row, 4),
            v: PlaneSpec::new(v, packed_row, 4),
            chroma_shift_x: 1,
            chroma_shift_y: 0,
        };

        Some(match self {
            YuvLayout::I420 => planar(true),
            YuvLayout::YV12 => planar(false),
            YuvLayout::NV12 => semi_planar(true),
            YuvLayout::NV21 => semi_planar(false),
            YuvLayout::YUYV => packed(0, 1, 3),
            YuvLayout::UYVY => packed(1, 0, 2),
        })
    }
}

impl fmt::Display for YuvLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for YuvLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "i420" | "yu12" => Ok(YuvLayout::I420),
            "yv12" => Ok(YuvLayout::YV12),
            "nv12" => Ok(YuvLayout::NV12),
            "nv21" => Ok(YuvLayout::NV21),
            "yuyv" | "yuy2" => Ok(YuvLayout::YUYV),
            "uyvy" => Ok(YuvLayout::UYVY),
            _ => Err(Error::UnknownLayout(s.to_string())),
        }
    }
}
