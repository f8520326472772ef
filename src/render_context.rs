// SPDX-License-Identifier: GPL-3.0-only

//! Fixed-size conversion context
//!
//! A [`RenderContext`] owns one RGBA buffer sized for its frame dimensions
//! and a converter. Each [`RenderContext::render`] call converts a frame
//! into that buffer and lends it out until the next call.

use tracing::{debug, warn};

use crate::backends::{BackendType, CpuConverter, FrameConverter, create_converter};
use crate::constants::RGBA_BYTES_PER_PIXEL;
use crate::errors::{Error, Result};
use crate::frame::YuvFrame;

pub struct RenderContext {
    width: u32,
    height: u32,
    backend: BackendType,
    converter: Box<dyn FrameConverter>,
    buffer: Vec<u8>,
}

impl RenderContext {
    /// Create a context for `width` x `height` frames
    pub fn new(width: u32, height: u32, backend: BackendType) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_frame(format!(
                "render context needs a non-empty size, got {}x{}",
                width, height
            )));
        }
        let converter = create_converter(backend)?;
        Ok(Self::with_converter(width, height, backend, converter))
    }

    /// Create a context around an existing converter
    pub fn with_converter(
        width: u32,
        height: u32,
        backend: BackendType,
        converter: Box<dyn FrameConverter>,
    ) -> Self {
        let len = width as usize * height as usize * RGBA_BYTES_PER_PIXEL;
        debug!(width, height, converter = converter.name(), "Render context created");
        Self {
            width,
            height,
            backend,
            converter,
            buffer: vec![0; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Name of the converter currently in use
    pub fn converter_name(&self) -> &'static str {
        self.converter.name()
    }

    /// Convert `frame` and return the RGBA bytes
    ///
    /// Pixel `i` is at `4*i..4*i+4` in R, G, B, A order. The slice is reused
    /// by the next render, so analyse or copy it first.
    pub fn render(&mut self, frame: &YuvFrame<'_>) -> Result<&[u8]> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(Error::DimensionMismatch {
                width: self.width,
                height: self.height,
                got_width: frame.width(),
                got_height: frame.height(),
            });
        }

        match self.converter.convert_into(frame, &mut self.buffer) {
            Ok(()) => {}
            // A lost GPU device in auto mode degrades to the CPU path
            Err(Error::Gpu(msg)) if self.backend == BackendType::Auto => {
                warn!(
                    converter = self.converter.name(),
                    error = %msg,
                    "Conversion failed, switching to CPU"
                );
                self.converter = Box::new(CpuConverter::new());
                self.converter.convert_into(frame, &mut self.buffer)?;
            }
            Err(e) => return Err(e),
        }

        Ok(&self.buffer)
    }
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("backend", &self.backend)
            .field("converter", &self.converter.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::YuvLayout;

    struct FailingGpu;

    impl FrameConverter for FailingGpu {
        fn name(&self) -> &'static str {
            "gpu"
        }

        fn convert_into(&mut self, _frame: &YuvFrame<'_>, _out: &mut [u8]) -> Result<()> {
            Err(Error::gpu("device lost"))
        }
    }

    fn gray_frame_data(w: u32, h: u32) -> Vec<u8> {
        vec![128; YuvLayout::NV21.frame_size(w, h).unwrap()]
    }

    #[test]
    fn test_render_cpu() {
        let mut ctx = RenderContext::new(4, 2, BackendType::Cpu).unwrap();
        let data = gray_frame_data(4, 2);
        let frame = YuvFrame::new(&data, 4, 2, YuvLayout::NV21).unwrap();

        let rgba = ctx.render(&frame).unwrap();
        assert_eq!(rgba.len(), 4 * 2 * 4);
        for px in rgba.chunks_exact(4) {
            assert_eq!(px, [128, 127, 127, 255]);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut ctx = RenderContext::new(4, 4, BackendType::Cpu).unwrap();
        let data = gray_frame_data(4, 2);
        let frame = YuvFrame::new(&data, 4, 2, YuvLayout::NV21).unwrap();

        match ctx.render(&frame) {
            Err(Error::DimensionMismatch {
                width: 4,
                height: 4,
                got_width: 4,
                got_height: 2,
            }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_size_rejected() {
        assert!(RenderContext::new(0, 10, BackendType::Cpu).is_err());
    }

    #[test]
    fn test_auto_falls_back_on_gpu_error() {
        let mut ctx = RenderContext::with_converter(2, 2, BackendType::Auto, Box::new(FailingGpu));
        let data = gray_frame_data(2, 2);
        let frame = YuvFrame::new(&data, 2, 2, YuvLayout::NV21).unwrap();

        assert!(ctx.render(&frame).is_ok());
        assert_eq!(ctx.converter_name(), "cpu");
    }

    #[test]
    fn test_explicit_gpu_error_surfaces() {
        let mut ctx = RenderContext::with_converter(2, 2, BackendType::Gpu, Box::new(FailingGpu));
        let data = gray_frame_data(2, 2);
        let frame = YuvFrame::new(&data, 2, 2, YuvLayout::NV21).unwrap();

        assert!(matches!(ctx.render(&frame), Err(Error::Gpu(_))));
        assert_eq!(ctx.converter_name(), "gpu");
    }
}
