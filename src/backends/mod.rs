// SPDX-License-Identifier: GPL-3.0-only

//! Frame conversion backends
//!
//! Both backends run the same per-pixel transform over every coordinate of a
//! frame and produce identical bytes:
//!
//! - [`cpu`]: rayon parallel-for over output rows
//! - [`GpuConverter`]: wgpu compute dispatch with read-back
//!
//! [`create_converter`] picks one from a [`BackendType`], falling back to the
//! CPU when no GPU adapter is available in `Auto` mode.

pub mod cpu;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::Result;
use crate::frame::YuvFrame;
use crate::shaders::yuv_convert::YuvConvertProcessor;

pub use cpu::{CpuConverter, convert_frame, convert_frame_to_vec};

/// Which converter to run frames through
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// GPU when an adapter is available, CPU otherwise
    #[default]
    Auto,
    /// Parallel CPU conversion
    Cpu,
    /// wgpu compute shader
    Gpu,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::Auto => write!(f, "auto"),
            BackendType::Cpu => write!(f, "cpu"),
            BackendType::Gpu => write!(f, "gpu"),
        }
    }
}

/// Converts whole frames into a caller-provided RGBA buffer
pub trait FrameConverter: Send {
    /// Short backend name for logging
    fn name(&self) -> &'static str;

    /// Convert every pixel of `frame` into `out` (`width * height * 4` bytes)
    fn convert_into(&mut self, frame: &YuvFrame<'_>, out: &mut [u8]) -> Result<()>;
}

/// Blocking adapter around [`YuvConvertProcessor`]
pub struct GpuConverter {
    processor: YuvConvertProcessor,
}

impl GpuConverter {
    pub fn new() -> Result<Self> {
        let processor = pollster::block_on(YuvConvertProcessor::new())?;
        Ok(Self { processor })
    }
}

impl FrameConverter for GpuConverter {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn convert_into(&mut self, frame: &YuvFrame<'_>, out: &mut [u8]) -> Result<()> {
        cpu::check_output_len(frame, out)?;
        pollster::block_on(self.processor.convert_into(frame, out))
    }
}

/// Create a converter for the requested backend
pub fn create_converter(backend: BackendType) -> Result<Box<dyn FrameConverter>> {
    let converter: Box<dyn FrameConverter> = match backend {
        BackendType::Cpu => Box::new(CpuConverter::new()),
        BackendType::Gpu => Box::new(GpuConverter::new()?),
        BackendType::Auto => match GpuConverter::new() {
            Ok(gpu) => Box::new(gpu),
            Err(e) => {
                warn!(error = %e, "GPU converter unavailable, falling back to CPU");
                Box::new(CpuConverter::new())
            }
        },
    };
    info!(requested = %backend, selected = converter.name(), "Frame converter ready");
    Ok(converter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_serde_names() {
        let json = serde_json::to_string(&BackendType::Gpu).unwrap();
        assert_eq!(json, "\"gpu\"");
        let parsed: BackendType = serde_json::from_str("\"cpu\"").unwrap();
        assert_eq!(parsed, BackendType::Cpu);
        assert_eq!(BackendType::default(), BackendType::Auto);
    }

    #[test]
    fn test_create_cpu_converter() {
        let converter = create_converter(BackendType::Cpu).unwrap();
        assert_eq!(converter.name(), "cpu");
    }

    #[test]
    fn test_auto_always_yields_a_converter() {
        // Falls back to the CPU on machines without a GPU
        let converter = create_converter(BackendType::Auto).unwrap();
        assert!(matches!(converter.name(), "cpu" | "gpu"));
    }
}
