//! Error types for the compositing engine.

use crate::params::BitmapRole;

/// Errors produced while parsing color definitions and catalogs.
#[derive(Debug, thiserror::Error)]
pub enum ColorError {
    #[error("invalid hex color {hex:?}: {source}")]
    InvalidHex {
        hex: String,
        source: palette::rgb::FromHexError,
    },
    #[error("hex {hex:?} does not match rgb {rgb:?} for color {id}")]
    HexMismatch { id: u32, hex: String, rgb: [u8; 3] },
    #[error("failed to parse color catalog: {0}")]
    Catalog(#[from] serde_json::Error),
}

/// Errors produced by the render pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{role} bitmap is {actual:?}, expected {expected:?}")]
    DimensionMismatch {
        role: BitmapRole,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("pixel data length {len} does not match {width}x{height}")]
    BufferSize { width: u32, height: u32, len: usize },
    #[error("failed to encode PNG: {0}")]
    Encode(image::ImageError),
    #[error("failed to decode rendered image: {0}")]
    Decode(String),
}
