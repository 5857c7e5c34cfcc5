//! Mask-driven pixel compositing: yarn pixels are tone mapped, floor pixels
//! pass through with an optional ambient bleed of the target color.
//!
//! # Per pixel
//! ```text
//!   alpha = 255 − mask
//!   alpha <  10  → floor:  src, tinted toward target by radiosity
//!   alpha >= 10  → yarn:   lut[luma(src)] × cavity(luma)
//!                          lerp(src, yarn, alpha / 255) on soft mask edges
//! ```
//!
//! Output alpha is always 255. Rows are independent; `composite_rows` runs a
//! row range so callers can tile the work.

use glam::Vec3;

use crate::color::luma_index;
use crate::image::{GrayMask, PixelBuffer};
use crate::tone::ToneLut;

/// Opacity below which a pixel belongs to the floor.
const YARN_ALPHA_THRESHOLD: u8 = 10;
/// Floor pixels brighter than this (as shadow strength) receive no bleed.
const MIN_SHADOW_STRENGTH: f32 = 0.02;
/// Rows above this vertical weight receive no bleed.
const MIN_GRADIENT: f32 = 0.01;
/// Upper bound on how far a floor pixel moves toward the target color.
const MAX_TINT: f32 = 0.9;
const RADIOSITY_GAIN: f32 = 6.0;

/// Inputs shared by every pixel of one composite pass.
#[derive(Debug, Clone, Copy)]
pub struct CompositeParams<'a> {
    pub lut: &'a ToneLut,
    /// Saturation-boosted target color.
    pub target: [u8; 3],
    pub cavity_intensity: f32,
    pub radiosity_intensity: f32,
}

/// Composite the whole image.
pub fn composite(source: &PixelBuffer, mask: &GrayMask, params: &CompositeParams<'_>) -> PixelBuffer {
    let mut out = PixelBuffer::filled(source.width, source.height, [0, 0, 0, 255]);
    composite_rows(source, mask, params, 0..source.height, &mut out);
    out
}

/// Composite rows `rows` of `source` into the same rows of `out`.
///
/// All three buffers must share dimensions.
pub fn composite_rows(
    source: &PixelBuffer,
    mask: &GrayMask,
    params: &CompositeParams<'_>,
    rows: std::ops::Range<u32>,
    out: &mut PixelBuffer,
) {
    let height = source.height as f32;
    let target = Vec3::from_array(params.target.map(f32::from));

    for y in rows {
        // Ambient bounce is strongest near the floor at the bottom of the frame.
        let gradient = (y as f32 / height).powi(3);

        for x in 0..source.width {
            let src = source.get(x, y);
            let mask_value = mask.get(x, y);
            let alpha = 255 - mask_value;
            let rgb = [src[0], src[1], src[2]];
            let luma = luma_index(rgb);

            let composed = if alpha < YARN_ALPHA_THRESHOLD {
                floor_pixel(rgb, luma, gradient, target, params.radiosity_intensity)
            } else {
                let yarn = yarn_pixel(luma, params);
                if mask_value > 0 && mask_value < 255 {
                    mix(rgb, yarn, alpha as f32 / 255.0)
                } else {
                    yarn
                }
            };

            out.put(x, y, [composed[0], composed[1], composed[2], 255]);
        }
    }
}

fn yarn_pixel(luma: u8, params: &CompositeParams<'_>) -> [u8; 3] {
    let toned = params.lut.lookup(luma);
    if params.cavity_intensity <= 0.0 {
        return toned;
    }
    // Darker texture is read as deeper recess.
    let factor = 1.0 - params.cavity_intensity + (luma as f32 / 255.0) * params.cavity_intensity;
    toned.map(|c| to_u8(c as f32 * factor))
}

fn floor_pixel(rgb: [u8; 3], luma: u8, gradient: f32, target: Vec3, radiosity: f32) -> [u8; 3] {
    if radiosity <= 0.0 {
        return rgb;
    }
    let shadow_strength = (255 - luma) as f32 / 255.0;
    if shadow_strength <= MIN_SHADOW_STRENGTH || gradient <= MIN_GRADIENT {
        return rgb;
    }
    let tint = (shadow_strength * gradient * radiosity * RADIOSITY_GAIN).min(MAX_TINT);
    let src = Vec3::from_array(rgb.map(f32::from));
    let [r, g, b] = src.lerp(target, tint).to_array();
    [to_u8(r), to_u8(g), to_u8(b)]
}

/// Linear blend from `a` to `b` by `t`.
fn mix(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    [0usize, 1, 2].map(|c| to_u8(a[c] as f32 + (b[c] as f32 - a[c] as f32) * t))
}

#[inline]
pub(crate) fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
