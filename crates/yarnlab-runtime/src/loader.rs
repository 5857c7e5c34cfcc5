//! Bitmap loading: the asynchronous edge of the render lifecycle.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use yarnlab_core::BitmapRef;

use crate::error::LoadError;

/// Resolves a [`BitmapRef`] to a decoded image.
///
/// Loads for one request run concurrently; implementations must not assume
/// any completion order.
pub trait BitmapLoader: Send + Sync + 'static {
    fn load(&self, reference: &BitmapRef) -> impl Future<Output = Result<DynamicImage, LoadError>> + Send;
}

/// Loads bitmaps from disk. Relative references resolve against `root`;
/// a `file://` prefix is accepted.
#[derive(Debug, Clone)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, reference: &BitmapRef) -> PathBuf {
        let raw = reference.as_str();
        let path = Path::new(raw.strip_prefix("file://").unwrap_or(raw));
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl BitmapLoader for FileLoader {
    async fn load(&self, reference: &BitmapRef) -> Result<DynamicImage, LoadError> {
        let path = self.resolve(reference);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| LoadError::Io { path: path.clone(), source })?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "bitmap read");
        image::load_from_memory(&bytes).map_err(|source| LoadError::Decode {
            reference: reference.clone(),
            source,
        })
    }
}

/// Serves pre-decoded images, for hosts that already hold the bitmaps.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    images: HashMap<BitmapRef, DynamicImage>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<BitmapRef>, image: DynamicImage) {
        self.images.insert(reference.into(), image);
    }

    pub fn with(mut self, reference: impl Into<BitmapRef>, image: DynamicImage) -> Self {
        self.insert(reference, image);
        self
    }
}

impl BitmapLoader for MemoryLoader {
    async fn load(&self, reference: &BitmapRef) -> Result<DynamicImage, LoadError> {
        self.images
            .get(reference)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(reference.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_loader_resolution() {
        let loader = FileLoader::new("/assets");
        assert_eq!(loader.resolve(&"yarn/118.png".into()), PathBuf::from("/assets/yarn/118.png"));
        assert_eq!(loader.resolve(&"file:///tmp/m.png".into()), PathBuf::from("/tmp/m.png"));
    }

    #[tokio::test]
    async fn test_memory_loader_missing_reference() {
        let loader = MemoryLoader::new();
        let err = loader.load(&"nope.png".into()).await.unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_file_loader_reports_io_error() {
        let loader = FileLoader::new(std::env::temp_dir());
        let err = loader.load(&"yarnlab-definitely-missing.png".into()).await.unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
