//! Outline (TrueType / OpenType) font rasterizer

use crate::{Error, Result};
use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use fzpack_core::{FontAsset, GlyphRecord, PackedBitmap};

/// Printable ASCII, the range rendered from outline fonts
const FIRST_CODE: u32 = 32;
const LAST_CODE: u32 = 126;

/// Coverage at or above which a pixel is set
const COVERAGE_CUTOFF: f32 = 0.5;

/// Renders the printable ASCII range of an outline font at `pixel_size`
/// pixels per em into a bitmap font.
pub fn rasterize(font_bytes: &[u8], pixel_size: u32) -> Result<FontAsset> {
    if pixel_size == 0 {
        return Err(fzpack_core::Error::InvalidDimensions { width: 0, height: 0 }.into());
    }
    let font = FontRef::try_from_slice(font_bytes)
        .map_err(|e| Error::InvalidFontData(e.to_string()))?;
    let units_per_em = font
        .units_per_em()
        .ok_or_else(|| Error::InvalidFontData("font has no units per em".into()))?;

    // ab_glyph scales by the ascent-descent height, so express pixels per em in those terms
    let scale = pixel_size as f32 / units_per_em;
    let px_scale = PxScale::from(font.height_unscaled() * scale);
    let scaled = font.as_scaled(px_scale);

    let ascent = (font.ascent_unscaled().abs() * scale).round() as i32;
    let descent = (font.descent_unscaled().abs() * scale).round() as i32;
    let baseline = ascent as f32;

    let mut asset = FontAsset::new("outline");
    for code in FIRST_CODE..=LAST_CODE {
        let Some(c) = char::from_u32(code) else {
            continue;
        };
        let glyph_id = font.glyph_id(c);
        if glyph_id.0 == 0 {
            log::debug!("Outline font has no glyph for {c:?}");
            continue;
        }
        let advance = scaled.h_advance(glyph_id);
        if advance <= 0.0 {
            log::warn!("Glyph {c:?} has no advance, skipping");
            continue;
        }
        let width = advance.ceil() as u32;
        if width > u8::MAX as u32 {
            log::warn!("Glyph {c:?} is {width} pixels wide, skipping");
            continue;
        }

        let mut bitmap = PackedBitmap::new(width, pixel_size);
        let glyph = glyph_id.with_scale_and_position(px_scale, ab_glyph::point(0.0, baseline));
        if let Some(outlined) = scaled.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = bounds.min.x as i32 + px as i32;
                let y = bounds.min.y as i32 + py as i32;
                let inside = (0..width as i32).contains(&x) && (0..pixel_size as i32).contains(&y);
                if coverage >= COVERAGE_CUTOFF && inside {
                    bitmap.set(x as u32, y as u32, true);
                }
            });
        }
        asset.insert_glyph(GlyphRecord::new(code, 0, -descent, bitmap));
    }

    if asset.is_empty() {
        return Err(Error::NoGlyphsProduced);
    }

    asset.properties.bounding_box = asset.compute_bounds();
    asset.properties.ascent = ascent;
    asset.properties.descent = descent;
    asset.properties.line_spacing = (pixel_size as f32 * 0.15).ceil() as i32;
    log::debug!("Rasterized {} glyphs at {pixel_size}px", asset.len());
    Ok(asset)
}
