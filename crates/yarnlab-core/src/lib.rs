//! Yarnlab Core: the yarn color compositing engine.
//!
//! Recolors a neutral reference photograph of a yarn sample to an arbitrary
//! target color: saturation boost, luma-tuned tone curves, mask-driven
//! compositing, auxiliary lighting overlays, and the swatch annotation.
//! Pure and synchronous; loading and scheduling live in `yarnlab-runtime`.

pub mod annotate;
pub mod color;
pub mod composite;
pub mod error;
pub mod image;
pub mod overlay;
pub mod params;
pub mod render;
pub mod tone;

// Re-exports for convenience.
pub use color::{BoostedColor, ColorCatalog, ColorDefinition, boost_saturation};
pub use error::{ColorError, RenderError};
pub use image::{GrayMask, PixelBuffer};
pub use params::{BitmapRef, BitmapRole, ProcessingConfig};
pub use render::{RenderInputs, RenderResult, render, render_annotated};
pub use tone::ToneLut;
