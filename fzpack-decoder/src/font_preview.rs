//! Glyph sheet previews of bitmap fonts

use crate::bitmap_decoder::scale_image;
use crate::Result;
use fzpack_core::FontAsset;
use image::{Rgba, RgbaImage};

const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Gap between neighbouring cells, in font pixels
const CELL_GAP: u32 = 1;

/// Draws every glyph on a grid of `columns` cells per row, all sharing one
/// baseline, then enlarges the sheet by `scale`.
pub fn render_font_sheet(font: &FontAsset, columns: u32, scale: u32) -> Result<RgbaImage> {
    if font.is_empty() {
        return Err(fzpack_core::Error::EmptyFont.into());
    }
    let columns = columns.max(1);
    let bounds = font.compute_bounds();
    let cell_width = bounds.width.max(1) + CELL_GAP;
    let cell_height = bounds.height.max(1) + CELL_GAP;
    let rows = (font.len() as u32).div_ceil(columns);
    let top = bounds.y_offset + bounds.height as i32;

    let mut sheet = RgbaImage::from_pixel(cell_width * columns, cell_height * rows, PAPER);
    for (i, glyph) in font.glyphs().iter().enumerate() {
        let cell_x = (i as u32 % columns) * cell_width;
        let cell_y = (i as u32 / columns) * cell_height;
        let left = (glyph.x_offset - bounds.x_offset).max(0) as u32;
        let rise = (top - (glyph.y_offset + glyph.bitmap.height() as i32)).max(0) as u32;

        for y in 0..glyph.bitmap.height() {
            for x in 0..glyph.bitmap.width() {
                if glyph.bitmap.get(x, y) {
                    let px = cell_x + left + x;
                    let py = cell_y + rise + y;
                    if px < sheet.width() && py < sheet.height() {
                        sheet.put_pixel(px, py, INK);
                    }
                }
            }
        }
    }
    log::debug!(
        "Font sheet '{}': {} glyphs, {}x{} cells",
        font.name,
        font.len(),
        cell_width,
        cell_height
    );
    Ok(scale_image(&sheet, scale))
}
