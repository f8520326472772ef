// SPDX-License-Identifier: GPL-3.0-only

//! Borrowed YUV frame handle
//!
//! A [`YuvFrame`] is a validated, read-only view onto frame bytes owned by
//! the caller. It lives only as long as the borrow it was built from, so a
//! conversion dispatch can never outlive the frame it reads.

mod layout;

pub use layout::{LayoutPlanes, PlaneSpec, YuvLayout};

use crate::convert::YuvSample;
use crate::errors::{Error, Result};

/// One channel plane of a frame
///
/// Sample `(col, row)` is at `offset + row * row_stride + col * pixel_stride`.
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    data: &'a [u8],
    offset: usize,
    row_stride: usize,
    pixel_stride: usize,
}

impl<'a> Plane<'a> {
    pub fn new(data: &'a [u8], offset: usize, row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data,
            offset,
            row_stride,
            pixel_stride,
        }
    }

    fn with_spec(data: &'a [u8], spec: PlaneSpec) -> Self {
        Self::new(data, spec.offset, spec.row_stride, spec.pixel_stride)
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    pub fn pixel_stride(&self) -> usize {
        self.pixel_stride
    }

    #[inline]
    fn at(&self, col: u32, row: u32) -> u8 {
        self.data[self.offset + row as usize * self.row_stride + col as usize * self.pixel_stride]
    }

    /// Byte count needed to address `cols` x `rows` samples
    fn required_len(&self, cols: u32, rows: u32) -> Option<usize> {
        let last_row = (rows as usize - 1).checked_mul(self.row_stride)?;
        let last_col = (cols as usize - 1).checked_mul(self.pixel_stride)?;
        self.offset.checked_add(last_row)?.checked_add(last_col)?.checked_add(1)
    }

    fn validate(&self, name: &'static str, cols: u32, rows: u32) -> Result<()> {
        if self.row_stride == 0 || self.pixel_stride == 0 {
            return Err(Error::invalid_frame(format!(
                "{} plane has a zero stride (row {}, pixel {})",
                name, self.row_stride, self.pixel_stride
            )));
        }
        let required = self
            .required_len(cols, rows)
            .ok_or_else(|| Error::invalid_frame(format!("{} plane extent overflows", name)))?;
        if self.data.len() < required {
            return Err(Error::BufferTooSmall {
                plane: name,
                len: self.data.len(),
                required,
            });
        }
        Ok(())
    }
}

/// Read-only YUV frame with a chroma-aware sampling primitive
#[derive(Debug, Clone, Copy)]
pub struct YuvFrame<'a> {
    width: u32,
    height: u32,
    y: Plane<'a>,
    u: Plane<'a>,
    v: Plane<'a>,
    chroma_shift_x: u32,
    chroma_shift_y: u32,
}

impl<'a> YuvFrame<'a> {
    /// Wrap a contiguous buffer in one of the named layouts
    pub fn new(data: &'a [u8], width: u32, height: u32, layout: YuvLayout) -> Result<Self> {
        if layout.is_packed() && width % 2 != 0 {
            return Err(Error::invalid_frame(format!(
                "{} needs an even width, got {}",
                layout, width
            )));
        }
        let planes = layout.planes(width, height).ok_or_else(|| {
            Error::invalid_frame(format!(
                "{}x{} {} frame does not fit in memory",
                width, height, layout
            ))
        })?;
        Self::from_planes(
            width,
            height,
            Plane::with_spec(data, planes.y),
            Plane::with_spec(data, planes.u),
            Plane::with_spec(data, planes.v),
            planes.chroma_shift_x,
            planes.chroma_shift_y,
        )
    }

    /// Build a frame from arbitrary planes, e.g. camera buffers with padded rows
    ///
    /// Chroma planes are addressed at `(x >> chroma_shift_x, y >> chroma_shift_y)`.
    pub fn from_planes(
        width: u32,
        height: u32,
        y: Plane<'a>,
        u: Plane<'a>,
        v: Plane<'a>,
        chroma_shift_x: u32,
        chroma_shift_y: u32,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_frame(format!(
                "empty frame {}x{}",
                width, height
            )));
        }
        if chroma_shift_x > 1 || chroma_shift_y > 1 {
            return Err(Error::invalid_frame(format!(
                "unsupported chroma subsampling shift ({}, {})",
                chroma_shift_x, chroma_shift_y
            )));
        }

        let chroma_cols = width.div_ceil(1 << chroma_shift_x);
        let chroma_rows = height.div_ceil(1 << chroma_shift_y);
        y.validate("Y", width, height)?;
        u.validate("U", chroma_cols, chroma_rows)?;
        v.validate("V", chroma_cols, chroma_rows)?;

        Ok(Self {
            width,
            height,
            y,
            u,
            v,
            chroma_shift_x,
            chroma_shift_y,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn planes(&self) -> [&Plane<'a>; 3] {
        [&self.y, &self.u, &self.v]
    }

    pub fn chroma_shift(&self) -> (u32, u32) {
        (self.chroma_shift_x, self.chroma_shift_y)
    }

    /// Sample Y, U and V for output pixel `(x, y)`
    ///
    /// `(x, y)` must lie inside the frame. Out-of-range coordinates either
    /// panic on slice indexing or read a neighbouring sample; they never
    /// read outside the borrowed buffers.
    #[inline]
    pub fn sample(&self, x: u32, y: u32) -> YuvSample {
        debug_assert!(
            x < self.width && y < self.height,
            "sample ({x}, {y}) outside {}x{} frame",
            self.width,
            self.height
        );
        let cx = x >> self.chroma_shift_x;
        let cy = y >> self.chroma_shift_y;
        YuvSample {
            y: self.y.at(x, y),
            u: self.u.at(cx, cy),
            v: self.v.at(cx, cy),
        }
    }
}
