// SPDX-License-Identifier: GPL-3.0-only

//! Parallel CPU conversion
//!
//! Output rows are handed to rayon workers as disjoint `&mut` chunks while
//! every worker shares the read-only frame, so no locking is involved.

use rayon::prelude::*;
use tracing::trace;

use crate::constants::RGBA_BYTES_PER_PIXEL;
use crate::convert::{Rgba, convert};
use crate::errors::{Error, Result};
use crate::frame::YuvFrame;

use super::FrameConverter;

/// RGBA byte count for a frame
#[inline]
pub fn rgba_len(frame: &YuvFrame<'_>) -> usize {
    frame.width() as usize * frame.height() as usize * RGBA_BYTES_PER_PIXEL
}

pub(crate) fn check_output_len(frame: &YuvFrame<'_>, out: &[u8]) -> Result<()> {
    let expected = rgba_len(frame);
    if out.len() != expected {
        return Err(Error::OutputSize {
            len: out.len(),
            expected,
        });
    }
    Ok(())
}

/// Convert one output row
#[inline]
fn convert_row(frame: &YuvFrame<'_>, y: u32, row: &mut [u8]) {
    let pixels: &mut [Rgba] = bytemuck::cast_slice_mut(row);
    for (x, px) in pixels.iter_mut().enumerate() {
        *px = convert(frame, x as u32, y);
    }
}

/// Rayon parallel-for over output rows
fn dispatch_rows(frame: &YuvFrame<'_>, out: &mut [u8]) {
    let row_len = frame.width() as usize * RGBA_BYTES_PER_PIXEL;
    out.par_chunks_exact_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| convert_row(frame, y as u32, row));
}

/// Convert a whole frame into `out`, rows in parallel
pub fn convert_frame(frame: &YuvFrame<'_>, out: &mut [u8]) -> Result<()> {
    check_output_len(frame, out)?;
    dispatch_rows(frame, out);
    trace!(
        width = frame.width(),
        height = frame.height(),
        "Converted frame on CPU"
    );
    Ok(())
}

/// Convert a whole frame into a new RGBA buffer
pub fn convert_frame_to_vec(frame: &YuvFrame<'_>) -> Vec<u8> {
    let mut out = vec![0u8; rgba_len(frame)];
    dispatch_rows(frame, &mut out);
    out
}

/// [`FrameConverter`] running on the global rayon pool
#[derive(Debug, Default)]
pub struct CpuConverter;

impl CpuConverter {
    pub fn new() -> Self {
        Self
    }
}

impl FrameConverter for CpuConverter {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn convert_into(&mut self, frame: &YuvFrame<'_>, out: &mut [u8]) -> Result<()> {
        convert_frame(frame, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::YuvLayout;

    /// Deterministic non-trivial frame content
    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| ((i * 37 + 11) % 256) as u8).collect()
    }

    #[test]
    fn test_parallel_matches_per_pixel() {
        for layout in YuvLayout::ALL {
            let (w, h) = (18, 7);
            let data = pattern(layout.frame_size(w, h).unwrap());
            let frame = YuvFrame::new(&data, w, h, layout).unwrap();
            let out = convert_frame_to_vec(&frame);

            for y in 0..h {
                for x in 0..w {
                    let idx = ((y * w + x) * 4) as usize;
                    assert_eq!(
                        out[idx..idx + 4],
                        convert(&frame, x, y).to_array(),
                        "{} at ({}, {})",
                        layout,
                        x,
                        y
                    );
                }
            }
        }
    }

    #[test]
    fn test_convert_frame_rejects_wrong_output() {
        let data = vec![128u8; YuvLayout::I420.frame_size(4, 4).unwrap()];
        let frame = YuvFrame::new(&data, 4, 4, YuvLayout::I420).unwrap();
        let mut out = vec![0u8; 4 * 4 * 4 - 1];
        assert!(matches!(
            convert_frame(&frame, &mut out),
            Err(Error::OutputSize { expected: 64, .. })
        ));
    }

    #[test]
    fn test_converter_fills_buffer() {
        let mut data = vec![255u8; 16];
        data.extend_from_slice(&[128; 8]);
        let frame = YuvFrame::new(&data, 4, 4, YuvLayout::NV21).unwrap();
        let mut out = vec![0u8; rgba_len(&frame)];
        CpuConverter::new().convert_into(&frame, &mut out).unwrap();
        for px in out.chunks_exact(4) {
            assert_eq!(px, [255, 254, 254, 255]);
        }
    }

    #[test]
    fn test_deterministic() {
        let data = pattern(YuvLayout::YUYV.frame_size(8, 8).unwrap());
        let frame = YuvFrame::new(&data, 8, 8, YuvLayout::YUYV).unwrap();
        assert_eq!(convert_frame_to_vec(&frame), convert_frame_to_vec(&frame));
    }
}
