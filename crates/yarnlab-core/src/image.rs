//! Pixel buffers for the compositing pipeline.
//!
//! Color bitmaps are RGBA8. Masks are a distinct single-channel type so the
//! "red channel encodes opacity" convention is applied exactly once, at
//! construction.

use image::{DynamicImage, RgbaImage};

use crate::error::RenderError;

/// A rectangular grid of 8-bit RGBA samples, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width × height` RGBA samples.
    pub pixels: Vec<[u8; 4]>,
}

impl PixelBuffer {
    /// Buffer of the given size filled with one color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![rgba; (width as usize) * (height as usize)],
        }
    }

    /// Wrap raw RGBA bytes.
    pub fn from_raw(width: u32, height: u32, bytes: &[u8]) -> Result<Self, RenderError> {
        let expected = (width as usize) * (height as usize) * 4;
        if bytes.len() != expected {
            return Err(RenderError::BufferSize {
                width,
                height,
                len: bytes.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels: bytemuck::cast_slice::<u8, [u8; 4]>(bytes).to_vec(),
        })
    }

    /// Convert any decoded image to RGBA8.
    pub fn from_image(image: &DynamicImage) -> Self {
        Self::from(image.to_rgba8())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Sample at `(x, y)`. Panics when out of bounds.
    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[self.index(x, y)]
    }

    pub fn put(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let idx = self.index(x, y);
        self.pixels[idx] = rgba;
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Copy into an `image` crate buffer for encoding.
    pub fn to_rgba_image(&self) -> Result<RgbaImage, RenderError> {
        RgbaImage::from_raw(self.width, self.height, self.as_bytes().to_vec()).ok_or(
            RenderError::BufferSize {
                width: self.width,
                height: self.height,
                len: self.pixels.len() * 4,
            },
        )
    }

    /// Rows as slices, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[[u8; 4]]> {
        self.pixels.chunks_exact(self.width.max(1) as usize)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let pixels = bytemuck::cast_slice::<u8, [u8; 4]>(image.as_raw()).to_vec();
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// Single-channel 8-bit opacity mask. 0 = yarn, 255 = background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayMask {
    pub width: u32,
    pub height: u32,
    pub values: Vec<u8>,
}

impl GrayMask {
    /// Mask of the given size filled with one value.
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            values: vec![value; (width as usize) * (height as usize)],
        }
    }

    /// Build from a color bitmap by reading its red channel.
    pub fn from_red_channel(buffer: &PixelBuffer) -> Self {
        Self {
            width: buffer.width,
            height: buffer.height,
            values: buffer.pixels.iter().map(|px| px[0]).collect(),
        }
    }

    /// Build from any decoded image by reading its red channel.
    pub fn from_image(image: &DynamicImage) -> Self {
        Self::from_red_channel(&PixelBuffer::from_image(image))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.values[(y as usize) * (self.width as usize) + x as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_rejects_short_buffer() {
        let err = PixelBuffer::from_raw(2, 2, &[0; 15]).unwrap_err();
        assert!(matches!(err, RenderError::BufferSize { len: 15, .. }));
    }

    #[test]
    fn test_rgba_image_conversion_keeps_layout() {
        let mut buffer = PixelBuffer::filled(3, 2, [0, 0, 0, 255]);
        buffer.put(2, 1, [10, 20, 30, 40]);
        let image = buffer.to_rgba_image().unwrap();
        assert_eq!(image.get_pixel(2, 1).0, [10, 20, 30, 40]);
        assert_eq!(PixelBuffer::from(image), buffer);
    }

    #[test]
    fn test_mask_reads_red_channel_only() {
        let mut buffer = PixelBuffer::filled(2, 1, [255, 0, 0, 255]);
        buffer.put(1, 0, [7, 200, 200, 0]);
        let mask = GrayMask::from_red_channel(&buffer);
        assert_eq!(mask.values, [255, 7]);
    }
}
