//! Render configuration: bitmap references plus the tunable lighting surface.
//!
//! `ProcessingConfig` is immutable for the duration of one render; any change
//! is a new render request.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference to a bitmap (URL or path). Resolution is the loader's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BitmapRef(pub String);

impl BitmapRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BitmapRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for BitmapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The part a bitmap plays in a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitmapRole {
    /// Neutral reference photograph of the yarn.
    Source,
    /// Opacity mask; black = yarn, white = background.
    Mask,
    /// Externally authored cavity detail map.
    Cavity,
    /// Rim-light mask; white = lit.
    RimLight,
    /// Contact-shadow map.
    ContactShadow,
}

impl BitmapRole {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Mask => "mask",
            Self::Cavity => "cavity",
            Self::RimLight => "rim-light",
            Self::ContactShadow => "contact-shadow",
        }
    }
}

impl fmt::Display for BitmapRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Full tunable surface for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingConfig {
    /// Neutral reference photograph.
    pub source: BitmapRef,
    /// Opacity mask, read from its red channel.
    pub mask: BitmapRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cavity_map: Option<BitmapRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rim_light_map: Option<BitmapRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_shadow_map: Option<BitmapRef>,

    /// Saturation boost multiplier, ≥ 1 in practice.
    #[serde(default = "defaults::saturation")]
    pub saturation: f32,
    /// How far the highlight segment leans toward white, 0..1.
    #[serde(default = "defaults::highlight_mix")]
    pub highlight_mix: f32,
    /// Multiplier on the darkened target color at the shadow anchor, 0..1.
    #[serde(default = "defaults::shadow_intensity")]
    pub shadow_intensity: f32,
    /// Source luma (0..255) that maps exactly onto the target color.
    #[serde(default = "defaults::mid_point")]
    pub mid_point: f32,
    /// Procedural cavity darkening from the source texture, 0..1.
    #[serde(default)]
    pub cavity_intensity: f32,
    /// Opacity of the cavity map multiply, 0..1.
    #[serde(default = "defaults::overlay_opacity")]
    pub cavity_map_opacity: f32,
    /// Strength of the ambient color bleed onto the floor, ≥ 0.
    #[serde(default)]
    pub radiosity_intensity: f32,
    /// Nominal rim-light strength, 0..1.
    #[serde(default = "defaults::overlay_opacity")]
    pub rim_light_intensity: f32,
    /// Opacity of the contact-shadow multiply, 0..1.
    #[serde(default = "defaults::overlay_opacity")]
    pub contact_shadow_opacity: f32,
}

mod defaults {
    pub fn saturation() -> f32 {
        1.2
    }
    pub fn highlight_mix() -> f32 {
        0.25
    }
    pub fn shadow_intensity() -> f32 {
        0.3
    }
    pub fn mid_point() -> f32 {
        128.0
    }
    pub fn overlay_opacity() -> f32 {
        0.5
    }
}

impl ProcessingConfig {
    /// Config with default lighting for the given source and mask.
    pub fn new(source: impl Into<BitmapRef>, mask: impl Into<BitmapRef>) -> Self {
        Self {
            source: source.into(),
            mask: mask.into(),
            cavity_map: None,
            rim_light_map: None,
            contact_shadow_map: None,
            saturation: defaults::saturation(),
            highlight_mix: defaults::highlight_mix(),
            shadow_intensity: defaults::shadow_intensity(),
            mid_point: defaults::mid_point(),
            cavity_intensity: 0.0,
            cavity_map_opacity: defaults::overlay_opacity(),
            radiosity_intensity: 0.0,
            rim_light_intensity: defaults::overlay_opacity(),
            contact_shadow_opacity: defaults::overlay_opacity(),
        }
    }

    /// Every configured bitmap, source and mask first.
    pub fn requested_bitmaps(&self) -> Vec<(BitmapRole, BitmapRef)> {
        let mut out = vec![
            (BitmapRole::Source, self.source.clone()),
            (BitmapRole::Mask, self.mask.clone()),
        ];
        let optional = [
            (BitmapRole::Cavity, &self.cavity_map),
            (BitmapRole::RimLight, &self.rim_light_map),
            (BitmapRole::ContactShadow, &self.contact_shadow_map),
        ];
        for (role, reference) in optional {
            if let Some(reference) = reference {
                out.push((role, reference.clone()));
            }
        }
        out
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let json = r#"{"source":"yarn.png","mask":"mask.png","midPoint":140}"#;
        let config: ProcessingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.mid_point, 140.0);
        assert_eq!(config.saturation, 1.2);
        assert_eq!(config.radiosity_intensity, 0.0);
        assert!(config.cavity_map.is_none());
    }

    #[test]
    fn test_requested_bitmaps_order() {
        let mut config = ProcessingConfig::new("s.png", "m.png");
        config.contact_shadow_map = Some("shadow.png".into());
        config.cavity_map = Some("cavity.png".into());
        let roles: Vec<_> = config.requested_bitmaps().into_iter().map(|(r, _)| r).collect();
        assert_eq!(
            roles,
            [BitmapRole::Source, BitmapRole::Mask, BitmapRole::Cavity, BitmapRole::ContactShadow]
        );
    }
}
