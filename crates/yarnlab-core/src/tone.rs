//! Tone curve construction: maps source luma onto the target color.
//!
//! Three piecewise-linear segments per channel, sharing endpoints:
//!
//! ```text
//!   out
//!    │                              ╱ highlight
//!    │                   ________╱
//!    │         ____─────  boosted
//!    │    ____╱ start
//!    │ __╱
//!    └──┴──────┴──────────┴──────────────── source luma
//!       0     40      midPoint           255
//! ```
//!
//! Before baking, midpoint, highlight mix and shadow intensity are tuned from
//! the target's luma so very light colors do not blow out and very dark
//! colors keep a visible shadow ramp.

use glam::Vec3;

use crate::color::BoostedColor;
use crate::params::ProcessingConfig;

/// Source luma at which the shadow segment ends.
pub const SHADOW_ANCHOR: f32 = 40.0;

/// Target luma above which the curve is tuned for light colors.
const LIGHT_TARGET_LUMA: f32 = 200.0;
/// Target luma below which the curve is tuned for dark colors.
const DARK_TARGET_LUMA: f32 = 50.0;
/// Target luma below which the shadow anchor is pure black.
const BLACK_SHADOW_LUMA: f32 = 30.0;

/// Curve parameters after luma-dependent auto-tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneTuning {
    pub mid_point: f32,
    pub highlight_mix: f32,
    pub shadow_intensity: f32,
}

impl ToneTuning {
    /// Tune the configured curve for a target of the given luma.
    pub fn auto(target_luma: f32, config: &ProcessingConfig) -> Self {
        let mut tuning = Self {
            mid_point: config.mid_point,
            highlight_mix: config.highlight_mix,
            shadow_intensity: config.shadow_intensity,
        };

        if target_luma > LIGHT_TARGET_LUMA {
            tuning.mid_point = (tuning.mid_point + 10.0).min(250.0);
            tuning.highlight_mix *= 0.5;
        } else if target_luma < DARK_TARGET_LUMA {
            tuning.mid_point = (tuning.mid_point - 60.0).max(80.0);
            tuning.highlight_mix *= 1.2;
            tuning.shadow_intensity *= 0.8;
        }

        tuning
    }
}

/// Per-channel 256-entry lookup from source luma to output value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneLut {
    pub r: [u8; 256],
    pub g: [u8; 256],
    pub b: [u8; 256],
}

impl ToneLut {
    /// Auto-tune and bake the curve for a boosted target color.
    pub fn build(target: &BoostedColor, config: &ProcessingConfig) -> Self {
        let tuning = ToneTuning::auto(target.luma, config);
        tracing::debug!(
            target_luma = target.luma,
            mid_point = tuning.mid_point,
            highlight_mix = tuning.highlight_mix,
            shadow_intensity = tuning.shadow_intensity,
            "tone curve tuned"
        );
        Self::bake(target, &tuning)
    }

    /// Bake the curve with explicit tuning.
    pub fn bake(target: &BoostedColor, tuning: &ToneTuning) -> Self {
        let base = Vec3::from_array(target.rgb.map(f32::from));
        let start = if target.luma < BLACK_SHADOW_LUMA {
            Vec3::ZERO
        } else {
            base * tuning.shadow_intensity
        };
        let highlight = base + (Vec3::splat(255.0) - base) * tuning.highlight_mix;
        let mid = tuning.mid_point;

        let mut lut = Self {
            r: [0; 256],
            g: [0; 256],
            b: [0; 256],
        };

        for i in 0..256 {
            let x = i as f32;
            let value = if x < SHADOW_ANCHOR {
                Vec3::ZERO.lerp(start, x / SHADOW_ANCHOR)
            } else if x < mid {
                start.lerp(base, (x - SHADOW_ANCHOR) / (mid - SHADOW_ANCHOR))
            } else {
                let span = 255.0 - mid;
                let t = if span > 0.0 { (x - mid) / span } else { 0.0 };
                base.lerp(highlight, t)
            };

            let [r, g, b] = value.round().clamp(Vec3::ZERO, Vec3::splat(255.0)).to_array();
            lut.r[i] = r as u8;
            lut.g[i] = g as u8;
            lut.b[i] = b as u8;
        }

        lut
    }

    /// Output color for a source luma.
    #[inline]
    pub fn lookup(&self, luma: u8) -> [u8; 3] {
        let i = luma as usize;
        [self.r[i], self.g[i], self.b[i]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::boost_saturation;

    fn config() -> ProcessingConfig {
        let mut config = ProcessingConfig::new("s", "m");
        config.mid_point = 128.0;
        config.shadow_intensity = 0.3;
        config.highlight_mix = 0.25;
        config
    }

    fn channels(lut: &ToneLut) -> [&[u8; 256]; 3] {
        [&lut.r, &lut.g, &lut.b]
    }

    #[test]
    fn test_auto_tune_mid_range_is_unchanged() {
        let tuning = ToneTuning::auto(120.0, &config());
        assert_eq!(tuning.mid_point, 128.0);
        assert_eq!(tuning.highlight_mix, 0.25);
        assert_eq!(tuning.shadow_intensity, 0.3);
    }

    #[test]
    fn test_auto_tune_light_target() {
        let mut cfg = config();
        cfg.mid_point = 245.0;
        let tuning = ToneTuning::auto(230.0, &cfg);
        assert_eq!(tuning.mid_point, 250.0);
        assert!((tuning.highlight_mix - 0.125).abs() < 1e-6);
        assert_eq!(tuning.shadow_intensity, 0.3);
    }

    #[test]
    fn test_auto_tune_dark_target() {
        let tuning = ToneTuning::auto(20.0, &config());
        assert_eq!(tuning.mid_point, 80.0);
        assert!((tuning.highlight_mix - 0.3).abs() < 1e-6);
        assert!((tuning.shadow_intensity - 0.24).abs() < 1e-6);

        let mut cfg = config();
        cfg.mid_point = 200.0;
        assert_eq!(ToneTuning::auto(20.0, &cfg).mid_point, 140.0);
    }

    #[test]
    fn test_lut_endpoints() {
        let target = boost_saturation([180, 40, 40], 1.2);
        let lut = ToneLut::build(&target, &config());
        assert_eq!(lut.lookup(0), [0, 0, 0]);
        assert_eq!(lut.lookup(128), target.rgb);
        // highlight = base + (255 - base) × 0.25
        let expected_r = (target.rgb[0] as f32 + (255.0 - target.rgb[0] as f32) * 0.25).round() as u8;
        assert_eq!(lut.r[255], expected_r);
    }

    #[test]
    fn test_lut_is_continuous_at_shadow_anchor() {
        for rgb in [[180, 40, 40], [250, 250, 240], [20, 10, 60], [90, 160, 30]] {
            let target = boost_saturation(rgb, 1.2);
            let tuning = ToneTuning::auto(target.luma, &config());
            let lut = ToneLut::bake(&target, &tuning);
            for (c, channel) in channels(&lut).into_iter().enumerate() {
                let start = target.rgb[c] as f32 * tuning.shadow_intensity;
                let slope = (start / SHADOW_ANCHOR).ceil() as i16 + 1;
                let step = (channel[40] as i16 - channel[39] as i16).abs();
                assert!(step <= slope, "{rgb:?} channel {c}: step {step} > {slope}");
            }
        }
    }

    #[test]
    fn test_lut_is_continuous_at_mid_point() {
        for rgb in [[180, 40, 40], [250, 250, 240], [20, 10, 60]] {
            let target = boost_saturation(rgb, 1.2);
            let tuning = ToneTuning::auto(target.luma, &config());
            let lut = ToneLut::bake(&target, &tuning);
            let mid = tuning.mid_point as usize;
            for channel in channels(&lut) {
                let below = (channel[mid] as i16 - channel[mid - 1] as i16).abs();
                let above = (channel[mid + 1] as i16 - channel[mid] as i16).abs();
                // Neither side of the anchor jumps by more than a few levels.
                assert!(below <= 4 && above <= 4, "{rgb:?}: {below} / {above}");
            }
        }
    }

    #[test]
    fn test_very_dark_target_has_black_shadow_anchor() {
        let target = boost_saturation([10, 10, 30], 1.0);
        assert!(target.luma < 30.0);
        let lut = ToneLut::build(&target, &config());
        assert_eq!(lut.lookup(40), [0, 0, 0]);
    }

    #[test]
    fn test_lut_is_monotonic_per_channel() {
        let target = boost_saturation([120, 200, 90], 1.1);
        let lut = ToneLut::build(&target, &config());
        for channel in channels(&lut) {
            assert!(channel.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_mid_point_at_255_does_not_divide_by_zero() {
        let target = boost_saturation([120, 120, 120], 1.0);
        let tuning = ToneTuning {
            mid_point: 255.0,
            highlight_mix: 0.5,
            shadow_intensity: 0.3,
        };
        let lut = ToneLut::bake(&target, &tuning);
        assert_eq!(lut.lookup(255), target.rgb);
    }
}
