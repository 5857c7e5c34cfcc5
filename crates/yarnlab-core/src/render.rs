//! The full render: color transform → tone curve → composite → overlays,
//! optionally followed by the annotation, and PNG data-URI encoding.
//!
//! `render` is a pure function of its inputs; running it twice on identical
//! inputs yields identical bytes. Scheduling is the caller's concern.

use std::io::Cursor;
use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::annotate::annotate;
use crate::color::{ColorDefinition, boost_saturation};
use crate::composite::{CompositeParams, composite};
use crate::error::RenderError;
use crate::image::{GrayMask, PixelBuffer};
use crate::overlay::{OverlayMaps, apply_overlays};
use crate::params::{BitmapRole, ProcessingConfig};
use crate::tone::ToneLut;

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Decoded bitmaps for one render. All must share the source's dimensions.
#[derive(Debug, Clone)]
pub struct RenderInputs {
    pub source: PixelBuffer,
    pub mask: GrayMask,
    pub cavity: Option<PixelBuffer>,
    pub rim_light: Option<PixelBuffer>,
    pub contact_shadow: Option<PixelBuffer>,
}

impl RenderInputs {
    pub fn new(source: PixelBuffer, mask: GrayMask) -> Self {
        Self {
            source,
            mask,
            cavity: None,
            rim_light: None,
            contact_shadow: None,
        }
    }

    /// Reject any bitmap whose size differs from the source.
    pub fn validate(&self) -> Result<(), RenderError> {
        let expected = self.source.dimensions();
        let mut sizes = vec![(BitmapRole::Mask, self.mask.dimensions())];
        let optional = [
            (BitmapRole::Cavity, &self.cavity),
            (BitmapRole::RimLight, &self.rim_light),
            (BitmapRole::ContactShadow, &self.contact_shadow),
        ];
        for (role, map) in optional {
            if let Some(map) = map {
                sizes.push((role, map.dimensions()));
            }
        }

        match sizes.into_iter().find(|(_, actual)| *actual != expected) {
            Some((role, actual)) => Err(RenderError::DimensionMismatch {
                role,
                expected,
                actual,
            }),
            None => Ok(()),
        }
    }

    fn overlay_maps(&self) -> OverlayMaps<'_> {
        OverlayMaps {
            cavity: self.cavity.as_ref(),
            rim_light: self.rim_light.as_ref(),
            contact_shadow: self.contact_shadow.as_ref(),
        }
    }
}

/// Recolor the yarn in `inputs` to `rgb` under `config`.
pub fn render(
    inputs: &RenderInputs,
    rgb: [u8; 3],
    config: &ProcessingConfig,
) -> Result<PixelBuffer, RenderError> {
    inputs.validate()?;
    let started = Instant::now();

    let target = boost_saturation(rgb, config.saturation);
    let lut = ToneLut::build(&target, config);

    let params = CompositeParams {
        lut: &lut,
        target: target.rgb,
        cavity_intensity: config.cavity_intensity,
        radiosity_intensity: config.radiosity_intensity,
    };
    let mut out = composite(&inputs.source, &inputs.mask, &params);
    apply_overlays(&mut out, &inputs.overlay_maps(), &target, config);

    tracing::debug!(
        width = out.width,
        height = out.height,
        boosted = ?target.rgb,
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "render complete"
    );
    Ok(out)
}

/// `render` followed by the color-code label and swatch.
pub fn render_annotated(
    inputs: &RenderInputs,
    color: &ColorDefinition,
    config: &ProcessingConfig,
) -> Result<PixelBuffer, RenderError> {
    let mut out = render(inputs, color.rgb, config)?;
    annotate(&mut out, color);
    Ok(out)
}

/// A finished render, owned by the caller once delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResult {
    /// Catalog id of the rendered color.
    pub color_id: u32,
    /// `data:image/png;base64,...`
    pub data_uri: String,
}

impl RenderResult {
    /// Encode `buffer` as a PNG data URI.
    pub fn encode(color_id: u32, buffer: &PixelBuffer) -> Result<Self, RenderError> {
        let image = buffer.to_rgba_image()?;
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(RenderError::Encode)?;

        let mut data_uri = String::with_capacity(DATA_URI_PREFIX.len() + png.len() * 4 / 3 + 4);
        data_uri.push_str(DATA_URI_PREFIX);
        STANDARD.encode_string(&png, &mut data_uri);
        Ok(Self { color_id, data_uri })
    }

    /// The PNG bytes behind the data URI.
    pub fn png_bytes(&self) -> Result<Vec<u8>, RenderError> {
        let payload = self
            .data_uri
            .strip_prefix(DATA_URI_PREFIX)
            .ok_or_else(|| RenderError::Decode("not a PNG data URI".to_string()))?;
        STANDARD
            .decode(payload)
            .map_err(|e| RenderError::Decode(e.to_string()))
    }

    /// Decode back into a pixel buffer.
    pub fn decode(&self) -> Result<PixelBuffer, RenderError> {
        let png = self.png_bytes()?;
        let image = image::load_from_memory_with_format(&png, image::ImageFormat::Png)
            .map_err(|e| RenderError::Decode(e.to_string()))?;
        Ok(PixelBuffer::from_image(&image))
    }

    /// Download file name, `yarn-color-<id>.png`.
    pub fn file_name(&self) -> String {
        format!("yarn-color-{}.png", self.color_id)
    }
}
