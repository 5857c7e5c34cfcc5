//! Auxiliary lighting overlays, applied on top of the composited yarn.
//!
//! Order is fixed: cavity multiply, rim-light add, contact-shadow multiply.
//! A stage runs only when its map is supplied and its weight is nonzero.
//!
//! ```text
//! multiply: d' = d + (d·s − d) × opacity × a_s
//! add:      d' = min(1, d + tint·s × alpha × a_s)
//! ```
//!
//! The auxiliary map's own alpha scales its contribution, so transparent
//! regions of a map leave the image untouched.

use crate::color::BoostedColor;
use crate::composite::to_u8;
use crate::image::PixelBuffer;
use crate::params::ProcessingConfig;

/// Target luma below which the rim tint gets a flat brightness floor.
const RIM_FLOOR_LUMA: f32 = 80.0;

/// Borrowed auxiliary maps for one render.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayMaps<'a> {
    pub cavity: Option<&'a PixelBuffer>,
    pub rim_light: Option<&'a PixelBuffer>,
    pub contact_shadow: Option<&'a PixelBuffer>,
}

/// Run every enabled overlay stage on `dst`.
pub fn apply_overlays(
    dst: &mut PixelBuffer,
    maps: &OverlayMaps<'_>,
    target: &BoostedColor,
    config: &ProcessingConfig,
) {
    if let Some(cavity) = maps.cavity
        && config.cavity_map_opacity > 0.0
    {
        multiply(dst, cavity, config.cavity_map_opacity);
    }

    if let Some(rim) = maps.rim_light
        && config.rim_light_intensity > 0.0
    {
        let alpha = rim_alpha(config.rim_light_intensity, target.luma);
        add_rim_light(dst, rim, rim_tint(target), alpha);
    }

    if let Some(shadow) = maps.contact_shadow
        && config.contact_shadow_opacity > 0.0
    {
        multiply(dst, shadow, config.contact_shadow_opacity);
    }
}

/// Multiply-blend `map` onto `dst` at `opacity`.
pub fn multiply(dst: &mut PixelBuffer, map: &PixelBuffer, opacity: f32) {
    for (d, s) in dst.pixels.iter_mut().zip(&map.pixels) {
        let weight = opacity * s[3] as f32 / 255.0;
        for c in 0..3 {
            let base = d[c] as f32;
            let product = base * s[c] as f32 / 255.0;
            d[c] = to_u8(base + (product - base) * weight);
        }
    }
}

/// Rim tint color: the boosted target, lifted for dim targets.
pub fn rim_tint(target: &BoostedColor) -> [u8; 3] {
    if target.luma >= RIM_FLOOR_LUMA {
        return target.rgb;
    }
    let lift = RIM_FLOOR_LUMA - target.luma;
    target.rgb.map(|c| to_u8(c as f32 + lift))
}

/// Effective rim opacity. Rim light reads louder on dark yarn, so dark
/// targets get up to 2× the nominal intensity and light ones down to 0.1×.
pub fn rim_alpha(intensity: f32, target_luma: f32) -> f32 {
    let l = target_luma / 255.0;
    let luma_factor = 2.0 * (1.0 - l) + 0.1 * l;
    (intensity * luma_factor).min(1.0)
}

/// Additively composite `tint × rim_mask` onto `dst` at `alpha`.
///
/// The mask's alpha multiplies `alpha`, so a fully transparent rim pixel adds
/// nothing and a half-transparent one adds half, whatever its RGB. The tint
/// is never composited over the mask's transparent regions.
pub fn add_rim_light(dst: &mut PixelBuffer, rim_mask: &PixelBuffer, tint: [u8; 3], alpha: f32) {
    for (d, s) in dst.pixels.iter_mut().zip(&rim_mask.pixels) {
        let weight = alpha * s[3] as f32 / 255.0;
        for c in 0..3 {
            let lit = tint[c] as f32 * s[c] as f32 / 255.0;
            d[c] = to_u8(d[c] as f32 + lit * weight);
        }
    }
}
