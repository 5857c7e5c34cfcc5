//! Color-code label and swatch drawn over the finished render.
//!
//! The label uses the embedded 8×8 bitmap font scaled to about 8% of the
//! image width, bottom-right, dark fill over a white outline. The swatch is
//! a filled circle near the top-right in the color's own hex value, ringed
//! white then translucent black.

use font8x8::{BASIC_FONTS, UnicodeFonts};

use crate::color::ColorDefinition;
use crate::image::PixelBuffer;

/// Label fill color.
pub const LABEL_FILL: [u8; 3] = [34, 34, 34];
const OUTLINE: [u8; 3] = [255, 255, 255];
const SWATCH_OUTER_STROKE_ALPHA: f32 = 0.3;
const GLYPH_SIZE: i32 = 8;

/// Pixel geometry of the annotation for one image size and label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationLayout {
    /// Nominal font size in pixels.
    pub font_size: f32,
    /// Integer scale applied to the 8×8 glyphs.
    pub glyph_scale: i32,
    /// Extra horizontal pass for the bold weight, in pixels.
    pub bold_offset: i32,
    /// White outline radius in pixels.
    pub outline: i32,
    /// Margin from the image edges.
    pub padding: i32,
    /// Top-left of the label text.
    pub label_origin: (i32, i32),
    /// Label text extent, excluding the outline.
    pub label_size: (i32, i32),
    pub swatch_center: (f32, f32),
    pub swatch_radius: f32,
    pub swatch_stroke: f32,
}

impl AnnotationLayout {
    pub fn new(width: u32, height: u32, label: &str) -> Self {
        let font_size = width as f32 * 0.08;
        let glyph_scale = ((font_size / GLYPH_SIZE as f32).round() as i32).max(1);
        let bold_offset = (glyph_scale / 2).max(1);
        let outline = ((font_size * 0.12).round() as i32).max(1);
        let padding = (font_size * 0.5).round() as i32 + outline;

        let chars = label.chars().count() as i32;
        let label_size = (
            chars * GLYPH_SIZE * glyph_scale + bold_offset,
            GLYPH_SIZE * glyph_scale,
        );
        let label_origin = (
            width as i32 - padding - label_size.0,
            height as i32 - padding - label_size.1,
        );

        let swatch_radius = (font_size * 0.6).max(2.0);
        let swatch_stroke = (swatch_radius * 0.12).round().max(1.0);
        let swatch_center = (
            width as f32 - padding as f32 - swatch_radius - 2.0 * swatch_stroke,
            padding as f32 + swatch_radius + 2.0 * swatch_stroke,
        );

        Self {
            font_size,
            glyph_scale,
            bold_offset,
            outline,
            padding,
            label_origin,
            label_size,
            swatch_center,
            swatch_radius,
            swatch_stroke,
        }
    }
}

/// Draw the color code and swatch for `color` onto `buffer`.
pub fn annotate(buffer: &mut PixelBuffer, color: &ColorDefinition) {
    let label = color.id.to_string();
    let layout = AnnotationLayout::new(buffer.width, buffer.height, &label);
    let (x, y) = layout.label_origin;

    let o = layout.outline;
    for dy in -o..=o {
        for dx in -o..=o {
            if (dx == 0 && dy == 0) || dx * dx + dy * dy > o * o {
                continue;
            }
            draw_text(buffer, x + dx, y + dy, &label, OUTLINE, &layout);
        }
    }
    draw_text(buffer, x, y, &label, LABEL_FILL, &layout);

    draw_swatch(buffer, color.rgb, &layout);
}

/// Bold bitmap text: each glyph is stamped twice, `bold_offset` apart.
fn draw_text(buffer: &mut PixelBuffer, x: i32, y: i32, text: &str, rgb: [u8; 3], layout: &AnnotationLayout) {
    for pass in [0, layout.bold_offset] {
        let mut cursor_x = x + pass;
        for ch in text.chars() {
            if let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) {
                draw_glyph(buffer, cursor_x, y, &glyph, rgb, layout.glyph_scale);
            }
            cursor_x += GLYPH_SIZE * layout.glyph_scale;
        }
    }
}

fn draw_glyph(buffer: &mut PixelBuffer, x: i32, y: i32, glyph: &[u8; 8], rgb: [u8; 3], scale: i32) {
    for (row_idx, &row_bits) in glyph.iter().enumerate() {
        for col in 0..GLYPH_SIZE {
            if (row_bits >> col) & 1 == 0 {
                continue;
            }
            let px = x + col * scale;
            let py = y + row_idx as i32 * scale;
            for sy in 0..scale {
                for sx in 0..scale {
                    blend(buffer, px + sx, py + sy, rgb, 1.0);
                }
            }
        }
    }
}

fn draw_swatch(buffer: &mut PixelBuffer, rgb: [u8; 3], layout: &AnnotationLayout) {
    let (cx, cy) = layout.swatch_center;
    let r = layout.swatch_radius;
    let stroke = layout.swatch_stroke;
    let outer = r + 2.0 * stroke;

    let x0 = (cx - outer).floor() as i32;
    let x1 = (cx + outer).ceil() as i32;
    let y0 = (cy - outer).floor() as i32;
    let y1 = (cy + outer).ceil() as i32;

    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            if d <= r {
                blend(buffer, x, y, rgb, 1.0);
            } else if d <= r + stroke {
                blend(buffer, x, y, OUTLINE, 1.0);
            } else if d <= outer {
                blend(buffer, x, y, [0, 0, 0], SWATCH_OUTER_STROKE_ALPHA);
            }
        }
    }
}

/// Source-over onto an opaque pixel; out-of-bounds writes are clipped.
fn blend(buffer: &mut PixelBuffer, x: i32, y: i32, rgb: [u8; 3], alpha: f32) {
    if x < 0 || y < 0 || x >= buffer.width as i32 || y >= buffer.height as i32 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    let dst = buffer.get(x, y);
    let mut out = dst;
    for c in 0..3 {
        let v = dst[c] as f32 * (1.0 - alpha) + rgb[c] as f32 * alpha;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    buffer.put(x, y, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_color(buffer: &PixelBuffer, rgb: [u8; 3], region: (u32, u32, u32, u32)) -> usize {
        let (x0, y0, x1, y1) = region;
        let mut n = 0;
        for y in y0..y1 {
            for x in x0..x1 {
                if buffer.get(x, y)[..3] == rgb {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn test_layout_scales_with_width() {
        let small = AnnotationLayout::new(200, 200, "118");
        let large = AnnotationLayout::new(1000, 1000, "118");
        assert_eq!(small.glyph_scale, 2);
        assert_eq!(large.glyph_scale, 10);
        assert!((large.swatch_radius - 48.0).abs() < 1e-3);
        assert!(large.label_origin.0 > 500 && large.label_origin.1 > 800);
    }

    #[test]
    fn test_label_lands_bottom_right() {
        let mut buffer = PixelBuffer::filled(200, 200, [128, 128, 128, 255]);
        annotate(&mut buffer, &ColorDefinition::from_rgb(118, [180, 40, 40]));
        assert!(count_color(&buffer, LABEL_FILL, (100, 100, 200, 200)) > 0);
        assert_eq!(count_color(&buffer, LABEL_FILL, (0, 0, 100, 200)), 0);
        assert!(count_color(&buffer, OUTLINE, (100, 100, 200, 200)) > 0);
    }

    #[test]
    fn test_swatch_lands_top_right_in_color() {
        let mut buffer = PixelBuffer::filled(200, 200, [128, 128, 128, 255]);
        let color = ColorDefinition::from_rgb(7, [10, 220, 90]);
        annotate(&mut buffer, &color);
        let layout = AnnotationLayout::new(200, 200, "7");
        let (cx, cy) = layout.swatch_center;
        assert_eq!(buffer.get(cx as u32, cy as u32), [10, 220, 90, 255]);
        assert!(cx > 100.0 && cy < 100.0);
        assert_eq!(count_color(&buffer, color.rgb, (0, 100, 200, 200)), 0);
    }

    #[test]
    fn test_tiny_image_is_clipped_not_panicking() {
        let mut buffer = PixelBuffer::filled(3, 2, [0, 0, 0, 255]);
        annotate(&mut buffer, &ColorDefinition::from_rgb(123456, [1, 2, 3]));
        assert!(buffer.pixels.iter().all(|px| px[3] == 255));
    }
}
