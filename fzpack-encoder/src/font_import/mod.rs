//! Font source importers
//!
//! Every supported source format is turned into a [`FontAsset`]; the session
//! then encodes it as a glyph table.

pub mod bdf;
pub mod c_array;
pub mod pcf;

use crate::{outline, Result};
use fzpack_core::FontAsset;
use std::fmt;
use std::path::Path;

pub use bdf::{parse_bdf, BdfParser};
pub use c_array::{extract_font_section, import_c_array};
pub use pcf::{import_pcf, PcfFont};

/// Font source format, detected from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFormat {
    /// C source with a `U8G2_FONT_SECTION` literal
    CArray,
    /// Already encoded glyph table
    GlyphTable,
    Bdf,
    Pcf,
    /// TrueType or OpenType outlines
    Outline,
}

impl FontFormat {
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "c" | "h" => Ok(FontFormat::CArray),
            "u8f" => Ok(FontFormat::GlyphTable),
            "bdf" => Ok(FontFormat::Bdf),
            "pcf" => Ok(FontFormat::Pcf),
            "ttf" | "otf" => Ok(FontFormat::Outline),
            other => {
                let what = format!("font file extension '.{other}'");
                Err(fzpack_core::Error::UnsupportedEncoding(what).into())
            }
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let ext = path.as_ref().extension().and_then(|e| e.to_str()).unwrap_or_default();
        Self::from_extension(ext)
    }
}

impl fmt::Display for FontFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FontFormat::CArray => "C array",
            FontFormat::GlyphTable => "glyph table",
            FontFormat::Bdf => "BDF",
            FontFormat::Pcf => "PCF",
            FontFormat::Outline => "outline",
        })
    }
}

/// Imports a font of the given format and names it `name`.
///
/// `pixel_size` is only used for outline fonts.
pub fn import_font(
    name: &str,
    bytes: &[u8],
    format: FontFormat,
    pixel_size: u32,
) -> Result<FontAsset> {
    log::debug!("Importing {format} font '{name}' ({} bytes)", bytes.len());
    let mut font = match format {
        FontFormat::CArray => import_c_array(&String::from_utf8_lossy(bytes))?,
        FontFormat::GlyphTable => {
            let (font, report) = FontAsset::decode_with_report(bytes)?;
            if report.skipped > 0 {
                log::warn!("Font '{name}': {} truncated glyphs dropped", report.skipped);
            }
            font
        }
        FontFormat::Bdf => parse_bdf(&String::from_utf8_lossy(bytes)),
        FontFormat::Pcf => import_pcf(bytes)?,
        FontFormat::Outline => outline::rasterize(bytes, pixel_size)?,
    };

    if font.is_empty() {
        return Err(fzpack_core::Error::EmptyFont.into());
    }
    font.name = name.to_string();
    Ok(font)
}
