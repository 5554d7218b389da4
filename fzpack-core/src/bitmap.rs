//! 1-bit packed bitmaps
//!
//! Rows are padded to whole bytes. Pixel (x, y) lives in byte
//! `y * row_stride + x / 8` at bit `7 - x % 8`, so the leftmost pixel of a row
//! is the most significant bit of its first byte. A set bit is foreground
//! (dark) on the target display.

use crate::{Error, RasterImage, Result};

/// Default luminance threshold on the 0-255 scale. Pixels darker than this become set bits.
pub const DEFAULT_THRESHOLD: u8 = 128;

/// Pixels with an alpha value below this are background regardless of colour
const ALPHA_CUTOFF: u8 = 128;

/// A 1-bit-per-pixel image with byte-aligned rows
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PackedBitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PackedBitmap {
    /// Creates an all-background bitmap
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; Self::row_stride_for(width) * height as usize],
        }
    }

    /// Wraps already packed bytes, which must be exactly `row_stride * height` long
    pub fn from_bytes(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = Self::row_stride_for(width) * height as usize;
        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Bytes per row for a bitmap of the given width
    pub fn row_stride_for(width: u32) -> usize {
        (width as usize).div_ceil(8)
    }

    /// Packed size in bytes for the given dimensions
    pub fn byte_len_for(width: u32, height: u32) -> usize {
        Self::row_stride_for(width) * height as usize
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn row_stride(&self) -> usize {
        Self::row_stride_for(self.width)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// The packed bytes of row `y`.
    ///
    /// # Panics
    /// Panics if `y` is not below the bitmap height.
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {y} out of bounds for height {}", self.height);
        let stride = self.row_stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let (idx, mask) = self.locate(x, y);
        self.data[idx] & mask != 0
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let (idx, mask) = self.locate(x, y);
        if value {
            self.data[idx] |= mask;
        } else {
            self.data[idx] &= !mask;
        }
    }

    /// Number of set (foreground) pixels
    pub fn count_set(&self) -> usize {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.get(x, y))
            .count()
    }

    fn locate(&self, x: u32, y: u32) -> (usize, u8) {
        let idx = y as usize * self.row_stride() + x as usize / 8;
        (idx, 0x80 >> (x % 8))
    }
}

/// Weighted luminance of an RGB triple on the 0-255 scale
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Whether a pixel counts as foreground for the given threshold
pub fn is_dark(pixel: [u8; 4], threshold: u8) -> bool {
    let [r, g, b, a] = pixel;
    a >= ALPHA_CUTOFF && luminance(r, g, b) < threshold as f32
}

/// Quantizes an RGBA image into a packed bitmap. Dark, opaque pixels become set bits.
pub fn pack_monochrome(image: &RasterImage, threshold: u8) -> PackedBitmap {
    let mut bitmap = PackedBitmap::new(image.width(), image.height());
    for y in 0..image.height() {
        for x in 0..image.width() {
            if is_dark(image.pixel(x, y), threshold) {
                bitmap.set(x, y, true);
            }
        }
    }
    bitmap
}

/// Expands a packed bitmap into an opaque black and white image
pub fn unpack_monochrome(bitmap: &PackedBitmap) -> Result<RasterImage> {
    if bitmap.width() == 0 || bitmap.height() == 0 {
        return Err(Error::dimensions(bitmap.width(), bitmap.height()));
    }
    let mut pixels = Vec::with_capacity(bitmap.width() as usize * bitmap.height() as usize * 4);
    for y in 0..bitmap.height() {
        for x in 0..bitmap.width() {
            let value = if bitmap.get(x, y) { 0 } else { 255 };
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
    }
    RasterImage::from_rgba(bitmap.width(), bitmap.height(), pixels)
}
