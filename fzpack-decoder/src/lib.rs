//! fzpack Decoder Library
//!
//! This library turns fzpack containers, glyph tables and exported pack
//! archives back into images for inspection.

pub mod bitmap_decoder;
pub mod font_preview;
pub mod pack_reader;

pub use bitmap_decoder::{bitmap_to_image, decode_bm_frame_image, decode_bmx_image, scale_image};
pub use font_preview::render_font_sheet;
pub use pack_reader::{AnimationMeta, EntryProblem, IconEntry, ManifestEntry, PackReader};

/// Result type for fzpack-decoder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for fzpack-decoder operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("fzpack core error: {0}")]
    Core(#[from] fzpack_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Entry not found in pack: {0}")]
    MissingEntry(String),

    #[error("Invalid meta.txt for '{name}': {reason}")]
    InvalidMeta { name: String, reason: String },
}
