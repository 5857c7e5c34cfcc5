//! Target color definitions and the saturation-boost color transform.
//!
//! The boost runs in HSL: saturation is multiplied by the boost factor and
//! clamped to 1, hue and lightness are preserved. Perceptual luma of the
//! boosted color drives the tone curve auto-tuning downstream.
//!
//! ```text
//! rgb ──→ palette::Hsl ──→ s × boost (≤ 1) ──→ Srgb ──→ round ──→ boosted, luma
//! ```

use std::str::FromStr;

use palette::{FromColor, Hsl, Srgb};
use serde::{Deserialize, Serialize};

use crate::error::ColorError;

/// Rec. 601 luma weights, applied to 8-bit sRGB values.
pub const LUMA_REC601: [f32; 3] = [0.299, 0.587, 0.114];

/// A sellable yarn color. Created by a static catalog, never mutated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorDefinition {
    /// Catalog color code, printed on the rendered swatch.
    pub id: u32,
    /// 8-bit sRGB triple.
    pub rgb: [u8; 3],
    /// `#rrggbb` form of `rgb`.
    pub hex: String,
    /// Marketing name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Marketing description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ColorDefinition {
    /// Build a definition from an RGB triple, deriving the hex string.
    pub fn from_rgb(id: u32, rgb: [u8; 3]) -> Self {
        Self {
            id,
            rgb,
            hex: format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2]),
            name: None,
            description: None,
        }
    }

    /// Build a definition from a `#rrggbb`, `rrggbb` or `#rgb` string.
    pub fn from_hex(id: u32, hex: &str) -> Result<Self, ColorError> {
        let rgb = parse_hex(hex)?;
        Ok(Self::from_rgb(id, rgb))
    }

    /// Check that `hex` and `rgb` describe the same color.
    pub fn validate(&self) -> Result<(), ColorError> {
        if parse_hex(&self.hex)? != self.rgb {
            return Err(ColorError::HexMismatch {
                id: self.id,
                hex: self.hex.clone(),
                rgb: self.rgb,
            });
        }
        Ok(())
    }
}

fn parse_hex(hex: &str) -> Result<[u8; 3], ColorError> {
    let parsed = Srgb::<u8>::from_str(hex.trim()).map_err(|source| {
        ColorError::InvalidHex {
            hex: hex.to_string(),
            source,
        }
    })?;
    Ok([parsed.red, parsed.green, parsed.blue])
}

/// Ordered list of color definitions, as shipped by the storefront catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorCatalog {
    pub colors: Vec<ColorDefinition>,
}

impl ColorCatalog {
    /// Parse a catalog from JSON and validate every entry.
    pub fn from_json(json: &str) -> Result<Self, ColorError> {
        let catalog: Self = serde_json::from_str(json)?;
        for color in &catalog.colors {
            color.validate()?;
        }
        Ok(catalog)
    }

    /// Look up a color by its catalog id.
    pub fn get(&self, id: u32) -> Option<&ColorDefinition> {
        self.colors.iter().find(|c| c.id == id)
    }
}

/// Output of the color transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostedColor {
    /// Saturation-boosted color, rounded to 8 bits.
    pub rgb: [u8; 3],
    /// Perceptual luma of `rgb`, in `[0, 255]`.
    pub luma: f32,
}

/// Perceptual luma of an 8-bit RGB triple, in `[0, 255]`.
pub fn luma(rgb: [u8; 3]) -> f32 {
    LUMA_REC601[0] * rgb[0] as f32 + LUMA_REC601[1] * rgb[1] as f32 + LUMA_REC601[2] * rgb[2] as f32
}

/// Luma rounded to a LUT index.
pub fn luma_index(rgb: [u8; 3]) -> u8 {
    luma(rgb).round().clamp(0.0, 255.0) as u8
}

/// Multiply the HSL saturation of `rgb` by `boost` (clamped to 1).
///
/// `boost = 0` collapses to gray at the input's lightness; `boost = 1`
/// returns the input within rounding.
pub fn boost_saturation(rgb: [u8; 3], boost: f32) -> BoostedColor {
    let mut hsl: Hsl = Hsl::from_color(Srgb::new(rgb[0], rgb[1], rgb[2]).into_format::<f32>());
    hsl.saturation = (hsl.saturation * boost.max(0.0)).min(1.0);
    let boosted: Srgb = Srgb::from_color(hsl);
    let out = [boosted.red, boosted.green, boosted.blue].map(|c| (c * 255.0).round().clamp(0.0, 255.0) as u8);

    BoostedColor {
        rgb: out,
        luma: luma(out),
    }
}
