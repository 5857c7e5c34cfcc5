//! Render job files: one catalog color plus its processing config.
//!
//! ```json
//! {
//!   "color": { "id": 118, "rgb": [180, 40, 40], "hex": "#b42828" },
//!   "config": { "source": "yarn.png", "mask": "mask.png", "saturation": 1.2 }
//! }
//! ```

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use yarnlab_core::{ColorDefinition, ProcessingConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct RenderJob {
    pub color: ColorDefinition,
    pub config: ProcessingConfig,
}

impl RenderJob {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading job file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing job file {}", path.display()))
    }

    pub fn parse(json: &str) -> anyhow::Result<Self> {
        let job: Self = serde_json::from_str(json)?;
        job.color.validate()?;
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_job() {
        let job = RenderJob::parse(
            r##"{
                "color": {"id": 118, "rgb": [180, 40, 40], "hex": "#b42828"},
                "config": {"source": "yarn.png", "mask": "mask.png", "rimLightMap": "rim.png"}
            }"##,
        )
        .unwrap();
        assert_eq!(job.color.id, 118);
        assert_eq!(job.config.requested_bitmaps().len(), 3);
    }

    #[test]
    fn test_parse_rejects_inconsistent_color() {
        let err = RenderJob::parse(
            r##"{
                "color": {"id": 1, "rgb": [0, 0, 0], "hex": "#ffffff"},
                "config": {"source": "a.png", "mask": "b.png"}
            }"##,
        );
        assert!(err.is_err());
    }
}
