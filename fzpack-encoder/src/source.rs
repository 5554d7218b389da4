//! Image inputs accepted by the encoder

use crate::{Error, Result};
use fzpack_core::RasterImage;
use image::RgbaImage;
use std::path::Path;

/// An image handed to the encoder: either encoded file bytes or pixels that
/// were already decoded
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Encoded image file contents (PNG, BMP, GIF, ...)
    RawBytes(Vec<u8>),
    /// Decoded RGBA pixels
    Decoded(RasterImage),
}

impl ImageSource {
    /// Reads an image file without decoding it
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(ImageSource::RawBytes(std::fs::read(path)?))
    }

    /// Decodes the source into an RGBA raster
    pub fn normalize(&self) -> Result<RasterImage> {
        match self {
            ImageSource::RawBytes(bytes) => {
                if bytes.is_empty() {
                    return Err(Error::InvalidImageFormat("empty image data".into()));
                }
                let decoded = image::load_from_memory(bytes)
                    .map_err(|e| Error::InvalidImageFormat(e.to_string()))?;
                raster_from_rgba(decoded.to_rgba8())
            }
            ImageSource::Decoded(raster) => Ok(raster.clone()),
        }
    }
}

impl From<RasterImage> for ImageSource {
    fn from(raster: RasterImage) -> Self {
        ImageSource::Decoded(raster)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::RawBytes(bytes)
    }
}

impl TryFrom<RgbaImage> for ImageSource {
    type Error = Error;

    fn try_from(image: RgbaImage) -> Result<Self> {
        Ok(ImageSource::Decoded(raster_from_rgba(image)?))
    }
}

/// Converts an `image` buffer into a raster
pub fn raster_from_rgba(image: RgbaImage) -> Result<RasterImage> {
    let (width, height) = image.dimensions();
    Ok(RasterImage::from_rgba(width, height, image.into_raw())?)
}

/// Converts a raster into an `image` buffer
pub fn rgba_from_raster(raster: &RasterImage) -> Result<RgbaImage> {
    let (width, height) = (raster.width(), raster.height());
    RgbaImage::from_raw(width, height, raster.as_raw().to_vec()).ok_or_else(|| {
        fzpack_core::Error::SizeMismatch {
            expected: width as usize * height as usize * 4,
            actual: raster.as_raw().len(),
        }
        .into()
    })
}
