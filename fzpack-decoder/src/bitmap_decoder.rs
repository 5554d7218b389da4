//! Packed bitmaps and containers to RGBA images

use crate::Result;
use fzpack_core::{decode_bm_frame, decode_bmx, PackedBitmap};
use image::{imageops, ImageBuffer, Rgba, RgbaImage};

const FOREGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Renders set bits as opaque black on opaque white
pub fn bitmap_to_image(bitmap: &PackedBitmap) -> RgbaImage {
    ImageBuffer::from_fn(bitmap.width(), bitmap.height(), |x, y| {
        if bitmap.get(x, y) {
            FOREGROUND
        } else {
            BACKGROUND
        }
    })
}

/// Decodes a BMX container into an image
pub fn decode_bmx_image(bytes: &[u8]) -> Result<RgbaImage> {
    let decoded = decode_bmx(bytes)?;
    Ok(bitmap_to_image(&decoded.bitmap))
}

/// Decodes an animation frame of known size into an image
pub fn decode_bm_frame_image(bytes: &[u8], width: u32, height: u32) -> Result<RgbaImage> {
    let bitmap = decode_bm_frame(bytes, width, height)?;
    Ok(bitmap_to_image(&bitmap))
}

/// Enlarges an image by an integer factor without smoothing
pub fn scale_image(image: &RgbaImage, factor: u32) -> RgbaImage {
    if factor <= 1 {
        return image.clone();
    }
    imageops::resize(
        image,
        image.width() * factor,
        image.height() * factor,
        imageops::FilterType::Nearest,
    )
}
