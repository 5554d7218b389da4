//! Glyph-table font format
//!
//! A font is a 23 byte header followed by glyph records:
//!
//! ```text
//! header: u8 format (0) | u8 max width | u8 max height | i8 x offset | i8 y offset
//!         | u8 ascent | u8 descent | u8 line spacing | 15 reserved bytes
//! glyph:  u8 code | u8 width | u8 height | i8 x offset | i8 y offset | packed rows
//! ```
//!
//! Glyph rows use the same MSB-first packing as every other bitmap.

use crate::{Error, PackedBitmap, Result};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Write};

/// Size of the fixed font header
pub const FONT_HEADER_SIZE: usize = 23;

/// Size of a glyph record header
const GLYPH_HEADER_SIZE: usize = 5;

/// The only format identifier written and accepted
const FORMAT_ID: u8 = 0;

/// Glyph or font box in pixels. Offsets follow the BDF convention: `y_offset`
/// is the distance from the baseline to the bottom row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub width: u32,
    pub height: u32,
    pub x_offset: i32,
    pub y_offset: i32,
}

/// Font-wide metrics stored in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontProperties {
    pub bounding_box: BoundingBox,
    pub ascent: i32,
    pub descent: i32,
    pub line_spacing: i32,
}

/// One character: its code, placement and bitmap
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlyphRecord {
    pub code: u32,
    pub x_offset: i32,
    pub y_offset: i32,
    pub bitmap: PackedBitmap,
}

impl GlyphRecord {
    pub fn new(code: u32, x_offset: i32, y_offset: i32, bitmap: PackedBitmap) -> Self {
        Self {
            code,
            x_offset,
            y_offset,
            bitmap,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            width: self.bitmap.width(),
            height: self.bitmap.height(),
            x_offset: self.x_offset,
            y_offset: self.y_offset,
        }
    }

    /// Whether the record fits the one-byte fields of the glyph table
    fn is_encodable(&self) -> bool {
        self.code <= u8::MAX as u32
            && self.bitmap.width() <= u8::MAX as u32
            && self.bitmap.height() <= u8::MAX as u32
            && i8::try_from(self.x_offset).is_ok()
            && i8::try_from(self.y_offset).is_ok()
    }
}

/// Outcome of decoding a glyph table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeReport {
    /// Glyphs decoded successfully
    pub glyphs: usize,
    /// Glyphs cut off by the end of the buffer
    pub skipped: usize,
}

/// A bitmap font: metrics plus glyphs keyed by unique character code
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontAsset {
    pub name: String,
    pub properties: FontProperties,
    glyphs: Vec<GlyphRecord>,
}

impl FontAsset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adds a glyph, replacing any glyph with the same code at its original position
    pub fn insert_glyph(&mut self, glyph: GlyphRecord) {
        match self.glyphs.iter_mut().find(|g| g.code == glyph.code) {
            Some(existing) => *existing = glyph,
            None => self.glyphs.push(glyph),
        }
    }

    pub fn glyph(&self, code: u32) -> Option<&GlyphRecord> {
        self.glyphs.iter().find(|g| g.code == code)
    }

    /// Glyphs in insertion order
    pub fn glyphs(&self) -> &[GlyphRecord] {
        &self.glyphs
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Smallest box that contains every glyph, relative to the origin
    pub fn compute_bounds(&self) -> BoundingBox {
        if self.glyphs.is_empty() {
            return BoundingBox::default();
        }
        let min_x = self.glyphs.iter().map(|g| g.x_offset).min().unwrap_or(0);
        let min_y = self.glyphs.iter().map(|g| g.y_offset).min().unwrap_or(0);
        let max_x = self
            .glyphs
            .iter()
            .map(|g| g.x_offset + g.bitmap.width() as i32)
            .max()
            .unwrap_or(0);
        let max_y = self
            .glyphs
            .iter()
            .map(|g| g.y_offset + g.bitmap.height() as i32)
            .max()
            .unwrap_or(0);
        BoundingBox {
            width: (max_x - min_x).max(0) as u32,
            height: (max_y - min_y).max(0) as u32,
            x_offset: min_x,
            y_offset: min_y,
        }
    }

    /// Decodes a glyph table, dropping the truncation report
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_with_report(bytes).map(|(font, _)| font)
    }

    /// Decodes a glyph table. A truncated trailing glyph ends parsing and is
    /// counted in the report instead of failing the font.
    pub fn decode_with_report(bytes: &[u8]) -> Result<(Self, DecodeReport)> {
        if bytes.len() < FONT_HEADER_SIZE {
            return Err(Error::HeaderTooSmall(bytes.len()));
        }

        let mut reader = Cursor::new(bytes);
        let format = reader.read_u8()?;
        if format != FORMAT_ID {
            log::warn!("Glyph table declares format {format}, reading as format {FORMAT_ID}");
        }
        let max_width = reader.read_u8()?;
        let max_height = reader.read_u8()?;
        let x_offset = reader.read_i8()?;
        let y_offset = reader.read_i8()?;
        let ascent = reader.read_u8()?;
        let descent = reader.read_u8()?;
        let line_spacing = reader.read_u8()?;

        let mut font = FontAsset {
            name: String::new(),
            properties: FontProperties {
                bounding_box: BoundingBox {
                    width: max_width as u32,
                    height: max_height as u32,
                    x_offset: x_offset as i32,
                    y_offset: y_offset as i32,
                },
                ascent: ascent as i32,
                descent: descent as i32,
                line_spacing: line_spacing as i32,
            },
            glyphs: Vec::new(),
        };
        let mut report = DecodeReport::default();

        let mut pos = FONT_HEADER_SIZE;
        while pos < bytes.len() {
            let remaining = bytes.len() - pos;
            if remaining < GLYPH_HEADER_SIZE {
                log::warn!("Glyph table ends with {remaining} stray bytes at offset {pos}");
                report.skipped += 1;
                break;
            }

            let mut reader = Cursor::new(&bytes[pos..pos + GLYPH_HEADER_SIZE]);
            let code = reader.read_u8()?;
            let width = reader.read_u8()?;
            let height = reader.read_u8()?;
            let x_offset = reader.read_i8()?;
            let y_offset = reader.read_i8()?;

            let data_start = pos + GLYPH_HEADER_SIZE;
            let data_len = PackedBitmap::byte_len_for(width as u32, height as u32);
            if bytes.len() - data_start < data_len {
                log::warn!(
                    "Glyph {code} needs {data_len} bitmap bytes but only {} remain, stopping",
                    bytes.len() - data_start
                );
                report.skipped += 1;
                break;
            }

            let bitmap = PackedBitmap::from_bytes(
                width as u32,
                height as u32,
                bytes[data_start..data_start + data_len].to_vec(),
            )?;
            let glyph = GlyphRecord::new(code as u32, x_offset as i32, y_offset as i32, bitmap);
            font.insert_glyph(glyph);
            report.glyphs += 1;
            pos = data_start + data_len;
        }

        log::debug!("Decoded {} glyphs ({} skipped)", report.glyphs, report.skipped);
        Ok((font, report))
    }

    /// Encodes the font. Glyphs are written in ascending code order.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write(&mut buffer)?;
        Ok(buffer)
    }

    /// Writes the encoded font to a writer
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut glyphs: Vec<&GlyphRecord> = Vec::with_capacity(self.glyphs.len());
        for glyph in &self.glyphs {
            if glyph.is_encodable() {
                glyphs.push(glyph);
            } else {
                log::warn!(
                    "Skipping glyph {} ({}x{} at {},{}): does not fit the glyph table",
                    glyph.code,
                    glyph.bitmap.width(),
                    glyph.bitmap.height(),
                    glyph.x_offset,
                    glyph.y_offset
                );
            }
        }
        if glyphs.is_empty() {
            return Err(Error::EmptyFont);
        }
        glyphs.sort_by_key(|g| g.code);

        let props = &self.properties;
        let bbox = &props.bounding_box;
        writer.write_u8(FORMAT_ID)?;
        writer.write_u8(saturate_u8(bbox.width as i64))?;
        writer.write_u8(saturate_u8(bbox.height as i64))?;
        writer.write_i8(saturate_i8(bbox.x_offset))?;
        writer.write_i8(saturate_i8(bbox.y_offset))?;
        writer.write_u8(saturate_u8(props.ascent as i64))?;
        writer.write_u8(saturate_u8(props.descent as i64))?;
        writer.write_u8(saturate_u8(props.line_spacing as i64))?;
        writer.write_all(&[0u8; FONT_HEADER_SIZE - 8])?;

        for glyph in glyphs {
            writer.write_u8(glyph.code as u8)?;
            writer.write_u8(glyph.bitmap.width() as u8)?;
            writer.write_u8(glyph.bitmap.height() as u8)?;
            writer.write_i8(glyph.x_offset as i8)?;
            writer.write_i8(glyph.y_offset as i8)?;
            writer.write_all(glyph.bitmap.as_bytes())?;
        }
        Ok(())
    }
}

fn saturate_u8(value: i64) -> u8 {
    value.clamp(0, u8::MAX as i64) as u8
}

fn saturate_i8(value: i32) -> i8 {
    value.clamp(i8::MIN as i32, i8::MAX as i32) as i8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(code: u32, width: u32, height: u32, seed: u8) -> GlyphRecord {
        let len = PackedBitmap::byte_len_for(width, height);
        let data = (0..len).map(|i| seed.wrapping_mul(31).wrapping_add(i as u8)).collect();
        GlyphRecord::new(code, 1, -2, PackedBitmap::from_bytes(width, height, data).unwrap())
    }

    fn sample_font() -> FontAsset {
        let mut font = FontAsset::new("sample");
        font.properties = FontProperties {
            bounding_box: BoundingBox {
                width: 10,
                height: 12,
                x_offset: 0,
                y_offset: -2,
            },
            ascent: 10,
            descent: 2,
            line_spacing: 2,
        };
        font.insert_glyph(glyph(126, 5, 3, 7));
        font.insert_glyph(glyph(65, 10, 12, 1));
        font.insert_glyph(glyph(97, 6, 8, 3));
        font
    }

    #[test]
    fn test_font_roundtrip() {
        let font = sample_font();
        let bytes = font.encode().unwrap();
        let (decoded, report) = FontAsset::decode_with_report(&bytes).unwrap();

        assert_eq!(report, DecodeReport { glyphs: 3, skipped: 0 });
        assert_eq!(decoded.properties, font.properties);
        for code in [65, 97, 126] {
            let original = font.glyph(code).unwrap();
            let restored = decoded.glyph(code).unwrap();
            assert_eq!(restored.bounding_box(), original.bounding_box());
            assert_eq!(restored.bitmap.as_bytes(), original.bitmap.as_bytes());
        }
    }

    #[test]
    fn test_header_layout_and_order() {
        let bytes = sample_font().encode().unwrap();
        assert_eq!(&bytes[..8], &[0, 10, 12, 0, 0xFE, 10, 2, 2]);
        assert!(bytes[8..FONT_HEADER_SIZE].iter().all(|&b| b == 0));

        // 'A' (10x12, 24 bytes) comes first despite being inserted second
        assert_eq!(&bytes[23..28], &[65, 10, 12, 1, 0xFE]);
        assert_eq!(bytes[28 + 24], 97);
    }

    #[test]
    fn test_decode_header_too_small() {
        assert!(matches!(FontAsset::decode(&[0; 22]), Err(Error::HeaderTooSmall(22))));
    }

    #[test]
    fn test_decode_truncated_glyph_is_not_an_error() {
        let mut bytes = sample_font().encode().unwrap();
        bytes.truncate(bytes.len() - 1);
        let (font, report) = FontAsset::decode_with_report(&bytes).unwrap();
        assert_eq!(report, DecodeReport { glyphs: 2, skipped: 1 });
        assert!(font.glyph(126).is_none());
        assert!(font.glyph(97).is_some());
    }

    #[test]
    fn test_decode_stray_header_bytes() {
        let mut bytes = vec![0u8; FONT_HEADER_SIZE];
        bytes.extend_from_slice(&[33, 1, 1]);
        let (font, report) = FontAsset::decode_with_report(&bytes).unwrap();
        assert!(font.is_empty());
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_encode_empty_font() {
        assert!(matches!(FontAsset::new("empty").encode(), Err(Error::EmptyFont)));
    }

    #[test]
    fn test_encode_skips_wide_codes() {
        let mut font = FontAsset::new("unicode");
        font.insert_glyph(glyph(0x3042, 8, 8, 0));
        assert!(matches!(font.encode(), Err(Error::EmptyFont)));

        font.insert_glyph(glyph(66, 8, 8, 0));
        let decoded = FontAsset::decode(&font.encode().unwrap()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert!(decoded.glyph(66).is_some());
    }

    #[test]
    fn test_insert_replaces_same_code() {
        let mut font = FontAsset::new("dup");
        font.insert_glyph(glyph(65, 8, 1, 0));
        font.insert_glyph(glyph(66, 8, 1, 0));
        font.insert_glyph(glyph(65, 4, 4, 9));
        assert_eq!(font.len(), 2);
        assert_eq!(font.glyphs()[0].code, 65);
        assert_eq!(font.glyphs()[0].bitmap.width(), 4);
    }

    #[test]
    fn test_compute_bounds() {
        let mut font = FontAsset::new("bounds");
        font.insert_glyph(GlyphRecord::new(65, 0, -2, PackedBitmap::new(5, 9)));
        font.insert_glyph(GlyphRecord::new(66, 1, 0, PackedBitmap::new(6, 8)));
        assert_eq!(
            font.compute_bounds(),
            BoundingBox {
                width: 7,
                height: 10,
                x_offset: 0,
                y_offset: -2,
            }
        );
    }
}
