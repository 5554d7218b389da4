//! Immutable RGBA raster images

use crate::{Error, Result};

/// An RGBA8 image. Every transform produces a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    origin_width: u32,
    origin_height: u32,
}

impl RasterImage {
    /// Wraps an RGBA buffer. The origin size is the image's own size.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        Self::with_origin(width, height, pixels, width, height)
    }

    /// Wraps an RGBA buffer that was derived from a larger or smaller source.
    pub fn with_origin(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        origin_width: u32,
        origin_height: u32,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::dimensions(width, height));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            origin_width,
            origin_height,
        })
    }

    /// Creates an image filled with a single colour
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::dimensions(width, height));
        }
        let pixels = rgba.repeat(width as usize * height as usize);
        Self::from_rgba(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width of the image this one was resampled from
    pub fn origin_width(&self) -> u32 {
        self.origin_width
    }

    /// Height of the image this one was resampled from
    pub fn origin_height(&self) -> u32 {
        self.origin_height
    }

    /// Raw RGBA bytes, row-major
    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }

    /// Returns the RGBA value at (x, y).
    ///
    /// # Panics
    /// Panics if the coordinate lies outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Iterates over all pixels in row-major order
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.pixels.chunks_exact(4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Returns a copy of this image with every pixel passed through `f`
    pub fn map_pixels(&self, mut f: impl FnMut([u8; 4]) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(self.pixels.len());
        for px in self.pixels() {
            pixels.extend_from_slice(&f(px));
        }
        Self {
            width: self.width,
            height: self.height,
            pixels,
            origin_width: self.origin_width,
            origin_height: self.origin_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(matches!(
            RasterImage::from_rgba(0, 4, Vec::new()),
            Err(Error::InvalidDimensions { width: 0, height: 4 })
        ));
    }

    #[test]
    fn test_rejects_short_buffer() {
        let err = RasterImage::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { expected: 16, actual: 15 }));
    }

    #[test]
    fn test_pixel_access() {
        let mut raw = vec![0u8; 3 * 2 * 4];
        raw[(1 * 3 + 2) * 4..(1 * 3 + 2) * 4 + 4].copy_from_slice(&[1, 2, 3, 4]);
        let img = RasterImage::with_origin(3, 2, raw, 30, 20).unwrap();
        assert_eq!(img.pixel(2, 1), [1, 2, 3, 4]);
        assert_eq!(img.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!((img.origin_width(), img.origin_height()), (30, 20));
    }

    #[test]
    fn test_map_pixels_keeps_origin() {
        let img = RasterImage::with_origin(1, 1, vec![10, 20, 30, 40], 5, 5).unwrap();
        let mapped = img.map_pixels(|[r, g, b, a]| [b, g, r, a]);
        assert_eq!(mapped.pixel(0, 0), [30, 20, 10, 40]);
        assert_eq!(mapped.origin_width(), 5);
        assert_eq!(img.pixel(0, 0), [10, 20, 30, 40]);
    }
}
