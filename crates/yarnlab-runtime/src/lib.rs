//! Yarnlab Runtime: render lifecycle for the compositing engine.
//!
//! Loads the bitmaps a [`ProcessingConfig`](yarnlab_core::ProcessingConfig)
//! references, waits for all of them, runs the synchronous pipeline once per
//! request, and publishes the result unless the request went stale or the
//! controller was torn down in the meantime.

pub mod cancel;
pub mod controller;
pub mod error;
pub mod loader;

pub use cancel::CancellationToken;
pub use controller::{ControllerState, RenderController, RenderFailure};
pub use error::{ControllerError, LoadError};
pub use loader::{BitmapLoader, FileLoader, MemoryLoader};
