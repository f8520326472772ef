// SPDX-License-Identifier: GPL-3.0-only

//! Error types for frame conversion and the PPG pipeline
//!
//! The per-pixel transform itself never fails. Everything here describes
//! host-side problems: malformed frame descriptions, undersized buffers,
//! GPU setup failures and I/O around the CLI.

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Frame description is inconsistent (zero size, bad stride or shift)
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// A plane does not cover the last sample it is addressed at
    #[error("{plane} plane too small: {len} bytes, need {required}")]
    BufferTooSmall {
        plane: &'static str,
        len: usize,
        required: usize,
    },

    /// RGBA output buffer has the wrong length for the frame
    #[error("output buffer is {len} bytes, expected {expected}")]
    OutputSize { len: usize, expected: usize },

    /// Frame does not match the dimensions a context was created for
    #[error("frame is {got_width}x{got_height}, context expects {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },

    #[error("unknown YUV layout: {0}")]
    UnknownLayout(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("channel closed: {0}")]
    Channel(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(msg.into())
    }

    pub fn gpu(msg: impl Into<String>) -> Self {
        Self::Gpu(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
