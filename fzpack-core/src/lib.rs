//! fzpack Core Library
//!
//! This library provides the data model and the byte-exact codecs for the
//! monochrome asset formats: MSB-first packed bitmaps, the BMX icon container,
//! the BM animation frame, the 16 byte meta record and the glyph-table font.

pub mod bitmap;
pub mod category;
pub mod container;
pub mod font;
pub mod raster;

pub use bitmap::{
    is_dark, luminance, pack_monochrome, unpack_monochrome, PackedBitmap, DEFAULT_THRESHOLD,
};
pub use category::{IconCategory, RecommendedSize};
pub use container::{
    decode_bm_frame, decode_bmx, encode_bm_frame, encode_bmx, encode_bmx_with, validate_bmx,
    BmxHeader, Compression, DecodedBmx, MetaRecord, MAX_HEIGHT, MAX_WIDTH,
};
pub use font::{
    BoundingBox, DecodeReport, FontAsset, FontProperties, GlyphRecord, FONT_HEADER_SIZE,
};
pub use raster::RasterImage;

/// Result type for fzpack-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for fzpack-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    #[error("Size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Truncated data: need at least {needed} bytes, got {actual}")]
    TruncatedData { needed: usize, actual: usize },

    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Font section marker '{0}' not found")]
    MarkerNotFound(&'static str),

    #[error("Font header too small: {0} bytes")]
    HeaderTooSmall(usize),

    #[error("Font contains no glyphs")]
    EmptyFont,
}

impl Error {
    pub(crate) fn dimensions(width: impl Into<i64>, height: impl Into<i64>) -> Self {
        Error::InvalidDimensions {
            width: width.into(),
            height: height.into(),
        }
    }
}
