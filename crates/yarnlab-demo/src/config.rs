//! Application configuration for the demo.

use std::path::PathBuf;

/// Default directory bitmap references resolve against.
const DEFAULT_ASSET_ROOT: &str = ".";
/// Default directory rendered PNGs are written to.
const DEFAULT_OUT_DIR: &str = ".";

/// Runtime configuration for the yarnlab demo.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root for relative bitmap references (`YARNLAB_ASSET_ROOT`).
    pub asset_root: PathBuf,
    /// Output directory for `yarn-color-<id>.png` (`YARNLAB_OUT_DIR`).
    pub out_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            asset_root: std::env::var_os("YARNLAB_ASSET_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSET_ROOT)),
            out_dir: std::env::var_os("YARNLAB_OUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR)),
        }
    }
}
