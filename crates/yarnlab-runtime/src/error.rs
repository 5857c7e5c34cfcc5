//! Error types for bitmap loading and the render controller.

use std::path::PathBuf;

use yarnlab_core::{BitmapRef, RenderError};

/// Errors that can occur while loading a bitmap.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {reference}: {source}")]
    Decode {
        reference: BitmapRef,
        source: image::ImageError,
    },
    #[error("no bitmap registered for {0}")]
    NotFound(BitmapRef),
}

/// Errors surfaced by [`RenderController`](crate::RenderController) operations.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("render controller requires a tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error("no rendered result available")]
    NoResult,
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to write {path}: {source}")]
    Export {
        path: PathBuf,
        source: std::io::Error,
    },
}
