//! Nearest-neighbour resizing with optional letterboxing

use crate::source::rgba_from_raster;
use crate::Result;
use fzpack_core::{luminance, RasterImage};
use image::{imageops, ImageBuffer, Rgba, RgbaImage};

/// Where a scaled image lands inside the target canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f64,
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

/// Largest aspect-preserving fit of `src` into `target`, centred
pub fn fit_within(
    src_width: u32,
    src_height: u32,
    target_width: u32,
    target_height: u32,
) -> Placement {
    let (sw, sh) = (src_width as u64, src_height as u64);
    let (tw, th) = (target_width as u64, target_height as u64);

    // Integer comparison of tw/sw against th/sh avoids rounding the limiting side
    let (width, height, scale) = if tw * sh <= th * sw {
        (tw, sh * tw / sw, tw as f64 / sw as f64)
    } else {
        (sw * th / sh, th, th as f64 / sh as f64)
    };
    let width = width.max(1) as u32;
    let height = height.max(1) as u32;

    Placement {
        scale,
        width,
        height,
        x: (target_width - width) / 2,
        y: (target_height - height) / 2,
    }
}

/// Resizes `source` to exactly `target_width` x `target_height`.
///
/// With `preserve_aspect` the image is scaled uniformly, centred and the
/// border is left fully transparent; otherwise it is stretched. Sampling is
/// always nearest-neighbour so pixel art stays crisp.
pub fn resize(
    source: &RasterImage,
    target_width: u32,
    target_height: u32,
    preserve_aspect: bool,
) -> Result<RasterImage> {
    if target_width == 0 || target_height == 0 {
        return Err(fzpack_core::Error::InvalidDimensions {
            width: target_width as i64,
            height: target_height as i64,
        }
        .into());
    }

    let src = rgba_from_raster(source)?;
    let canvas = if preserve_aspect {
        let placement = fit_within(source.width(), source.height(), target_width, target_height);
        let scaled = sample_nearest(&src, placement.width, placement.height);
        let mut canvas = RgbaImage::from_pixel(target_width, target_height, Rgba([0, 0, 0, 0]));
        imageops::replace(&mut canvas, &scaled, placement.x as i64, placement.y as i64);
        canvas
    } else {
        sample_nearest(&src, target_width, target_height)
    };

    let (width, height) = canvas.dimensions();
    Ok(RasterImage::with_origin(
        width,
        height,
        canvas.into_raw(),
        source.origin_width(),
        source.origin_height(),
    )?)
}

/// Resizes and then snaps every pixel to black or white,
/// keeping alpha. This previews what the packed bitmap will look like.
pub fn resize_monochrome(
    source: &RasterImage,
    target_width: u32,
    target_height: u32,
    preserve_aspect: bool,
    threshold: u8,
) -> Result<RasterImage> {
    let resized = resize(source, target_width, target_height, preserve_aspect)?;
    Ok(resized.map_pixels(|[r, g, b, a]| {
        let value = if luminance(r, g, b) < threshold as f32 { 0 } else { 255 };
        [value, value, value, a]
    }))
}

/// Samples each destination pixel centre from the nearest source pixel
fn sample_nearest(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (sw, sh) = src.dimensions();
    if (sw, sh) == (width, height) {
        return src.clone();
    }
    ImageBuffer::from_fn(width, height, |x, y| {
        let sx = ((2 * x as u64 + 1) * sw as u64 / (2 * width as u64)).min(sw as u64 - 1) as u32;
        let sy = ((2 * y as u64 + 1) * sh as u64 / (2 * height as u64)).min(sh as u64 - 1) as u32;
        *src.get_pixel(sx, sy)
    })
}
