//! fzpack Encoder Library
//!
//! This library turns images and fonts into fzpack assets and assembles them
//! into a pack archive.

pub mod archive;
pub mod font_import;
pub mod outline;
pub mod resampler;
pub mod session;
pub mod source;

use std::path::Path;

pub use archive::{
    sanitize_pack_name, ArchiveEntry, Exclusion, ExportOptions, ExportReport, PackArchive,
};
pub use font_import::{import_font, FontFormat};
pub use resampler::{resize, resize_monochrome};
pub use session::{AnimationAsset, AnimationMetadata, FontEntry, IconAsset, PackSession};
pub use source::ImageSource;

/// Result type for fzpack-encoder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for fzpack-encoder operations
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

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid image format: {0}")]
    InvalidImageFormat(String),

    #[error("Invalid font data: {0}")]
    InvalidFontData(String),

    #[error("Rasterizing produced no glyphs")]
    NoGlyphsProduced,

    #[error("An asset named '{0}' already exists")]
    DuplicateName(String),

    #[error("No asset named '{0}'")]
    NotFound(String),

    #[error("Animation '{0}' has only one frame left")]
    LastFrame(String),

    #[error("Frame index {index} out of range for {len} frames")]
    FrameIndexOutOfRange { index: usize, len: usize },

    #[error("Animation '{0}' has no usable frames")]
    EmptyAnimation(String),

    #[error("Invalid pack name '{0}': use 1-32 of A-Z a-z 0-9 _ -")]
    InvalidPackName(String),

    #[error("'{name}' would be written to {path}, which another asset already uses")]
    PathCollision { name: String, path: String },
}

/// Encoder configuration
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Luminance below which a pixel becomes a set bit (0-255)
    pub threshold: u8,
    /// Frame rate given to new animations (clamped to at least 1)
    pub frame_rate: u32,
    /// Manifest level range and weight given to new animations
    pub min_level: i32,
    pub max_level: i32,
    pub weight: i32,
    /// Pixel size used when rasterizing outline fonts
    pub font_pixel_size: u32,
    /// Letterbox animation frames instead of stretching them
    pub preserve_aspect: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            threshold: fzpack_core::DEFAULT_THRESHOLD,
            frame_rate: 5,
            min_level: 1,
            max_level: 30,
            weight: 1,
            font_pixel_size: 12,
            preserve_aspect: true,
        }
    }
}

impl EncoderConfig {
    /// Parses a TOML configuration; missing keys keep their defaults
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EncoderConfig::default();
        assert_eq!(config.threshold, 128);
        assert_eq!(config.frame_rate, 5);
        assert!(config.preserve_aspect);
    }

    #[test]
    fn test_config_partial_toml() {
        let config = EncoderConfig::from_toml("frame_rate = 12\nthreshold = 100\n").unwrap();
        assert_eq!(config.frame_rate, 12);
        assert_eq!(config.threshold, 100);
        assert_eq!(config.max_level, 30);
    }

    #[test]
    fn test_config_rejects_bad_types() {
        assert!(matches!(
            EncoderConfig::from_toml("frame_rate = \"fast\""),
            Err(Error::Config(_))
        ));
    }
}
