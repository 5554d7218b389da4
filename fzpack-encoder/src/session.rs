//! The pack session: every icon, animation and font of one export

use crate::font_import::{import_font, FontFormat};
use crate::resampler::{resize, resize_monochrome};
use crate::source::ImageSource;
use crate::{EncoderConfig, Error, Result};
use fzpack_core::{
    pack_monochrome, FontAsset, IconCategory, MetaRecord, PackedBitmap, RasterImage, MAX_HEIGHT,
    MAX_WIDTH,
};
use std::path::{Path, PathBuf};

/// Canvas size of every animation frame
pub const FRAME_WIDTH: u32 = MAX_WIDTH;
pub const FRAME_HEIGHT: u32 = MAX_HEIGHT;

/// A still image exported as a BMX file
#[derive(Debug, Clone, PartialEq)]
pub struct IconAsset {
    name: String,
    category: IconCategory,
    image: RasterImage,
    original: RasterImage,
    bitmap: PackedBitmap,
    meta: MetaRecord,
}

impl IconAsset {
    fn build(
        name: String,
        category: IconCategory,
        original: RasterImage,
        image: RasterImage,
        threshold: u8,
    ) -> Self {
        let bitmap = pack_monochrome(&image, threshold);
        let meta = MetaRecord::for_icon(image.width(), image.height());
        Self {
            name,
            category,
            image,
            original,
            bitmap,
            meta,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> IconCategory {
        self.category
    }

    /// The image at its current size
    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    /// The image as it was first added; every resize starts from it
    pub fn original(&self) -> &RasterImage {
        &self.original
    }

    pub fn bitmap(&self) -> &PackedBitmap {
        &self.bitmap
    }

    pub fn meta(&self) -> MetaRecord {
        self.meta
    }
}

/// Manifest settings of an animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationMetadata {
    pub min_level: i32,
    pub max_level: i32,
    pub weight: i32,
}

impl Default for AnimationMetadata {
    fn default() -> Self {
        Self {
            min_level: 1,
            max_level: 30,
            weight: 1,
        }
    }
}

/// An ordered list of 128x64 frames plus playback and manifest settings
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationAsset {
    name: String,
    frames: Vec<RasterImage>,
    frame_rate: u32,
    metadata: AnimationMetadata,
}

impl AnimationAsset {
    /// Wraps frames that are already 128x64; only the session builds these.
    /// The frame rate is clamped to at least 1.
    pub(crate) fn new(
        name: impl Into<String>,
        frames: Vec<RasterImage>,
        frame_rate: u32,
        metadata: AnimationMetadata,
    ) -> Self {
        Self {
            name: name.into(),
            frames,
            frame_rate: frame_rate.max(1),
            metadata,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frames(&self) -> &[RasterImage] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    pub fn set_frame_rate(&mut self, frame_rate: u32) {
        self.frame_rate = frame_rate.max(1);
    }

    pub fn metadata(&self) -> AnimationMetadata {
        self.metadata
    }

    /// Total playback time in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.frames.len() as u64 * 1000 / self.frame_rate as u64
    }

    pub fn meta_record(&self) -> MetaRecord {
        MetaRecord::new(
            FRAME_WIDTH as i32,
            FRAME_HEIGHT as i32,
            self.frame_rate as i32,
            self.frames.len() as i32,
        )
    }

    /// Packs every frame with the given threshold
    pub fn bitmaps(&self, threshold: u8) -> Vec<PackedBitmap> {
        self.frames.iter().map(|f| pack_monochrome(f, threshold)).collect()
    }
}

/// An imported font together with its encoded glyph table
#[derive(Debug, Clone, PartialEq)]
pub struct FontEntry {
    font: FontAsset,
    encoded: Vec<u8>,
    source_path: Option<PathBuf>,
    format: FontFormat,
}

impl FontEntry {
    pub fn name(&self) -> &str {
        &self.font.name
    }

    pub fn font(&self) -> &FontAsset {
        &self.font
    }

    /// The glyph table written to the archive
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn format(&self) -> FontFormat {
        self.format
    }
}

/// Owns the assets of one pack. Each kind keeps insertion order and unique names.
#[derive(Debug, Clone, Default)]
pub struct PackSession {
    config: EncoderConfig,
    icons: Vec<IconAsset>,
    animations: Vec<AnimationAsset>,
    fonts: Vec<FontEntry>,
}

impl PackSession {
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn icons(&self) -> &[IconAsset] {
        &self.icons
    }

    pub fn animations(&self) -> &[AnimationAsset] {
        &self.animations
    }

    pub fn fonts(&self) -> &[FontEntry] {
        &self.fonts
    }

    pub fn icon(&self, name: &str) -> Option<&IconAsset> {
        self.icons.iter().find(|i| i.name == name)
    }

    pub fn animation(&self, name: &str) -> Option<&AnimationAsset> {
        self.animations.iter().find(|a| a.name == name)
    }

    pub fn font(&self, name: &str) -> Option<&FontEntry> {
        self.fonts.iter().find(|f| f.font.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty() && self.animations.is_empty() && self.fonts.is_empty()
    }

    // ---- icons ----

    /// Adds an icon, stretched to the category's canvas size
    pub fn add_icon(
        &mut self,
        name: &str,
        source: impl Into<ImageSource>,
        category: IconCategory,
    ) -> Result<&IconAsset> {
        if self.icon(name).is_some() {
            return Err(Error::DuplicateName(name.to_string()));
        }
        let original = source.into().normalize()?;
        let size = category.recommended_size();
        let image = resize(&original, size.width, size.height, false)?;
        log::debug!(
            "Icon '{name}': {}x{} -> {}x{} ({category})",
            original.width(),
            original.height(),
            size.width,
            size.height
        );
        let threshold = self.config.threshold;
        let icon = IconAsset::build(name.to_string(), category, original, image, threshold);
        self.icons.push(icon);
        Ok(&self.icons[self.icons.len() - 1])
    }

    /// Resizes an icon from its original image. With `monochrome` the stored
    /// image is snapped to black and white as well.
    pub fn resize_icon(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        monochrome: bool,
    ) -> Result<&IconAsset> {
        let index = self.icon_index(name)?;
        let icon = &self.icons[index];
        let in_range = width > 0 && height > 0 && width <= MAX_WIDTH && height <= MAX_HEIGHT;
        if !in_range || !icon.category.accepts_size(width, height) {
            return Err(fzpack_core::Error::InvalidDimensions {
                width: width as i64,
                height: height as i64,
            }
            .into());
        }

        let threshold = self.config.threshold;
        let image = if monochrome {
            resize_monochrome(&icon.original, width, height, false, threshold)?
        } else {
            resize(&icon.original, width, height, false)?
        };
        let updated = IconAsset::build(
            icon.name.clone(),
            icon.category,
            icon.original.clone(),
            image,
            threshold,
        );
        self.icons[index] = updated;
        Ok(&self.icons[index])
    }

    /// Moves an icon to another category, resizing it to that category's canvas
    pub fn set_icon_category(&mut self, name: &str, category: IconCategory) -> Result<&IconAsset> {
        let index = self.icon_index(name)?;
        let icon = &self.icons[index];
        let size = category.recommended_size();
        let image = resize(&icon.original, size.width, size.height, false)?;
        let updated = IconAsset::build(
            icon.name.clone(),
            category,
            icon.original.clone(),
            image,
            self.config.threshold,
        );
        self.icons[index] = updated;
        Ok(&self.icons[index])
    }

    pub fn rename_icon(&mut self, name: &str, new_name: &str) -> Result<()> {
        let index = self.icon_index(name)?;
        if name != new_name && self.icon(new_name).is_some() {
            return Err(Error::DuplicateName(new_name.to_string()));
        }
        let mut renamed = self.icons.remove(index);
        renamed.name = new_name.to_string();
        self.icons.insert(index, renamed);
        Ok(())
    }

    pub fn remove_icon(&mut self, name: &str) -> Result<IconAsset> {
        let index = self.icon_index(name)?;
        Ok(self.icons.remove(index))
    }

    fn icon_index(&self, name: &str) -> Result<usize> {
        self.icons
            .iter()
            .position(|i| i.name == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    // ---- animations ----

    /// Creates an animation from the decodable sources; undecodable frames are skipped
    pub fn add_animation(
        &mut self,
        name: &str,
        sources: Vec<ImageSource>,
    ) -> Result<&AnimationAsset> {
        if self.animation(name).is_some() {
            return Err(Error::DuplicateName(name.to_string()));
        }
        let frames = self.prepare_frames(name, sources);
        if frames.is_empty() {
            return Err(Error::EmptyAnimation(name.to_string()));
        }
        let metadata = AnimationMetadata {
            min_level: self.config.min_level,
            max_level: self.config.max_level,
            weight: self.config.weight,
        };
        log::debug!("Animation '{name}': {} frames", frames.len());
        self.animations
            .push(AnimationAsset::new(name, frames, self.config.frame_rate, metadata));
        Ok(&self.animations[self.animations.len() - 1])
    }

    /// Appends frames and returns how many were usable
    pub fn add_frames(&mut self, name: &str, sources: Vec<ImageSource>) -> Result<usize> {
        let index = self.animation_index(name)?;
        let frames = self.prepare_frames(name, sources);
        let added = frames.len();
        self.animations[index].frames.extend(frames);
        Ok(added)
    }

    /// Removes one frame; an animation always keeps at least one
    pub fn delete_frame(&mut self, name: &str, frame: usize) -> Result<()> {
        let index = self.animation_index(name)?;
        let animation = &mut self.animations[index];
        let len = animation.frames.len();
        if frame >= len {
            return Err(Error::FrameIndexOutOfRange { index: frame, len });
        }
        if len == 1 {
            return Err(Error::LastFrame(name.to_string()));
        }
        animation.frames.remove(frame);
        Ok(())
    }

    /// Moves the frame at `from` so that it ends up at index `to`
    pub fn reorder_frames(&mut self, name: &str, from: usize, to: usize) -> Result<()> {
        let index = self.animation_index(name)?;
        let frames = &mut self.animations[index].frames;
        let len = frames.len();
        for i in [from, to] {
            if i >= len {
                return Err(Error::FrameIndexOutOfRange { index: i, len });
            }
        }
        let frame = frames.remove(from);
        frames.insert(to, frame);
        Ok(())
    }

    pub fn update_animation_metadata(
        &mut self,
        name: &str,
        metadata: AnimationMetadata,
    ) -> Result<()> {
        let index = self.animation_index(name)?;
        self.animations[index].metadata = metadata;
        Ok(())
    }

    pub fn set_frame_rate(&mut self, name: &str, frame_rate: u32) -> Result<()> {
        let index = self.animation_index(name)?;
        self.animations[index].set_frame_rate(frame_rate);
        Ok(())
    }

    pub fn rename_animation(&mut self, name: &str, new_name: &str) -> Result<()> {
        let index = self.animation_index(name)?;
        if name != new_name && self.animation(new_name).is_some() {
            return Err(Error::DuplicateName(new_name.to_string()));
        }
        self.animations[index].name = new_name.to_string();
        Ok(())
    }

    pub fn remove_animation(&mut self, name: &str) -> Result<AnimationAsset> {
        let index = self.animation_index(name)?;
        Ok(self.animations.remove(index))
    }

    fn animation_index(&self, name: &str) -> Result<usize> {
        self.animations
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    fn prepare_frames(&self, name: &str, sources: Vec<ImageSource>) -> Vec<RasterImage> {
        let mut frames = Vec::with_capacity(sources.len());
        let preserve_aspect = self.config.preserve_aspect;
        for (i, source) in sources.into_iter().enumerate() {
            let frame = source
                .normalize()
                .and_then(|image| resize(&image, FRAME_WIDTH, FRAME_HEIGHT, preserve_aspect));
            match frame {
                Ok(frame) => frames.push(frame),
                Err(e) => log::warn!("Animation '{name}': skipping frame {i}: {e}"),
            }
        }
        frames
    }

    // ---- fonts ----

    /// Imports a font, detecting its format from the path's extension
    pub fn add_font(
        &mut self,
        name: &str,
        path: impl AsRef<Path>,
        bytes: &[u8],
    ) -> Result<&FontEntry> {
        let path = path.as_ref();
        let format = FontFormat::from_path(path)?;
        self.add_font_with_format(name, Some(path), bytes, format)
    }

    pub fn add_font_with_format(
        &mut self,
        name: &str,
        path: Option<&Path>,
        bytes: &[u8],
        format: FontFormat,
    ) -> Result<&FontEntry> {
        if self.font(name).is_some() {
            return Err(Error::DuplicateName(name.to_string()));
        }
        let font = import_font(name, bytes, format, self.config.font_pixel_size)?;
        let encoded = font.encode()?;
        log::debug!("Font '{name}': {} glyphs, {} bytes", font.len(), encoded.len());
        self.fonts.push(FontEntry {
            font,
            encoded,
            source_path: path.map(Path::to_path_buf),
            format,
        });
        Ok(&self.fonts[self.fonts.len() - 1])
    }

    pub fn remove_font(&mut self, name: &str) -> Result<FontEntry> {
        let index = self
            .fonts
            .iter()
            .position(|f| f.font.name == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        Ok(self.fonts.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> ImageSource {
        RasterImage::filled(width, height, rgba).unwrap().into()
    }

    fn frame(shade: u8) -> ImageSource {
        solid(FRAME_WIDTH, FRAME_HEIGHT, [shade, 0, 0, 255])
    }

    fn session_with_animation(frames: usize) -> PackSession {
        let mut session = PackSession::default();
        let sources = (0..frames).map(|i| frame(i as u8 * 10)).collect();
        session.add_animation("walk", sources).unwrap();
        session
    }

    fn shades(session: &PackSession) -> Vec<u8> {
        session
            .animation("walk")
            .unwrap()
            .frames()
            .iter()
            .map(|f| f.pixel(0, 0)[0])
            .collect()
    }

    #[test]
    fn test_icon_stretched_to_category() {
        let mut session = PackSession::default();
        let icon = session
            .add_icon("card", solid(10, 10, [0, 0, 0, 255]), IconCategory::Passport)
            .unwrap();
        assert_eq!((icon.image().width(), icon.image().height()), (46, 49));
        assert_eq!((icon.original().width(), icon.original().height()), (10, 10));
        assert_eq!(icon.meta(), MetaRecord::new(46, 49, 0, 1));
        assert_eq!(icon.bitmap().count_set(), 46 * 49);
    }

    #[test]
    fn test_duplicate_icon_rejected() {
        let mut session = PackSession::default();
        session.add_icon("a", solid(4, 4, [0; 4]), IconCategory::Default).unwrap();
        assert!(matches!(
            session.add_icon("a", solid(4, 4, [0; 4]), IconCategory::Default),
            Err(Error::DuplicateName(_))
        ));
    }

    #[test]
    fn test_resize_icon_rules() {
        let mut session = PackSession::default();
        session
            .add_icon("free", solid(20, 20, [255, 255, 255, 255]), IconCategory::Default)
            .unwrap();
        session
            .add_icon("fixed", solid(20, 20, [255, 255, 255, 255]), IconCategory::RFID)
            .unwrap();

        let icon = session.resize_icon("free", 32, 16, false).unwrap();
        assert_eq!((icon.image().width(), icon.image().height()), (32, 16));
        assert_eq!(icon.meta(), MetaRecord::new(32, 16, 0, 1));

        assert!(matches!(
            session.resize_icon("free", 129, 10, false),
            Err(Error::Core(fzpack_core::Error::InvalidDimensions { .. }))
        ));
        assert!(matches!(
            session.resize_icon("fixed", 32, 16, false),
            Err(Error::Core(fzpack_core::Error::InvalidDimensions { .. }))
        ));
        assert!(session.resize_icon("fixed", 97, 61, true).is_ok());
        assert!(matches!(session.resize_icon("ghost", 8, 8, false), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_category_change_resizes_from_original() {
        let mut session = PackSession::default();
        session.add_icon("x", solid(8, 8, [0, 0, 0, 255]), IconCategory::Passport).unwrap();
        let icon = session.set_icon_category("x", IconCategory::RFID).unwrap();
        assert_eq!(icon.category(), IconCategory::RFID);
        assert_eq!((icon.image().width(), icon.image().height()), (97, 61));
        assert_eq!((icon.original().width(), icon.original().height()), (8, 8));
    }

    #[test]
    fn test_rename_icon() {
        let mut session = PackSession::default();
        session.add_icon("a", solid(4, 4, [0; 4]), IconCategory::Default).unwrap();
        session.add_icon("b", solid(4, 4, [0; 4]), IconCategory::Default).unwrap();

        assert!(matches!(session.rename_icon("a", "b"), Err(Error::DuplicateName(_))));
        session.rename_icon("a", "c").unwrap();
        assert!(session.icon("a").is_none());
        let names: Vec<&str> = session.icons().iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["c", "b"]);
        session.rename_icon("c", "c").unwrap();

        session.remove_icon("c").unwrap();
        assert!(matches!(session.remove_icon("c"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_animation_skips_undecodable_frames() {
        let mut session = PackSession::default();
        let sources = vec![
            ImageSource::RawBytes(b"junk".to_vec()),
            solid(256, 128, [0, 0, 0, 255]),
        ];
        let anim = session.add_animation("a", sources).unwrap();
        assert_eq!(anim.frame_count(), 1);
        assert_eq!(anim.frame_rate(), 5);
        assert_eq!(anim.metadata(), AnimationMetadata::default());
        assert_eq!((anim.frames()[0].width(), anim.frames()[0].height()), (128, 64));

        assert!(matches!(
            session.add_animation("b", vec![ImageSource::RawBytes(Vec::new())]),
            Err(Error::EmptyAnimation(_))
        ));
        assert!(session.animation("b").is_none());
    }

    #[test]
    fn test_animation_frames_always_fill_display() {
        let mut session = PackSession::default();
        assert!(matches!(
            session.add_animation("none", Vec::new()),
            Err(Error::EmptyAnimation(_))
        ));

        let sources = vec![solid(10, 10, [0, 0, 0, 255]), solid(300, 20, [0, 0, 0, 255])];
        session.add_animation("mixed", sources).unwrap();
        session
            .add_frames("mixed", vec![solid(3, 90, [0, 0, 0, 255])])
            .unwrap();
        let anim = session.animation("mixed").unwrap();
        assert_eq!(anim.frame_count(), 3);
        assert!(anim
            .frames()
            .iter()
            .all(|f| (f.width(), f.height()) == (FRAME_WIDTH, FRAME_HEIGHT)));
    }

    #[test]
    fn test_delete_last_frame_rejected() {
        let mut session = session_with_animation(2);
        session.delete_frame("walk", 0).unwrap();
        assert_eq!(shades(&session), vec![10]);
        assert!(matches!(session.delete_frame("walk", 0), Err(Error::LastFrame(_))));
        assert_eq!(session.animation("walk").unwrap().frame_count(), 1);
        assert!(matches!(
            session.delete_frame("walk", 3),
            Err(Error::FrameIndexOutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_reorder_frames() {
        let mut session = session_with_animation(4);
        session.reorder_frames("walk", 0, 2).unwrap();
        assert_eq!(shades(&session), vec![10, 20, 0, 30]);
        session.reorder_frames("walk", 3, 0).unwrap();
        assert_eq!(shades(&session), vec![30, 10, 20, 0]);
        assert!(matches!(
            session.reorder_frames("walk", 0, 4),
            Err(Error::FrameIndexOutOfRange { index: 4, len: 4 })
        ));
    }

    #[test]
    fn test_frame_rate_and_metadata() {
        let mut session = session_with_animation(3);
        session.set_frame_rate("walk", 0).unwrap();
        assert_eq!(session.animation("walk").unwrap().frame_rate(), 1);
        session.set_frame_rate("walk", 6).unwrap();

        let metadata = AnimationMetadata {
            min_level: 5,
            max_level: 9,
            weight: 3,
        };
        session.update_animation_metadata("walk", metadata).unwrap();
        let anim = session.animation("walk").unwrap();
        assert_eq!(anim.metadata(), metadata);
        assert_eq!(anim.duration_ms(), 500);
        assert_eq!(anim.meta_record(), MetaRecord::new(128, 64, 6, 3));
        assert!(matches!(session.set_frame_rate("run", 3), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_add_frames_and_rename_animation() {
        let mut session = session_with_animation(1);
        let added = session
            .add_frames("walk", vec![frame(50), ImageSource::RawBytes(b"?".to_vec())])
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(shades(&session), vec![0, 50]);

        session.add_animation("idle", vec![frame(1)]).unwrap();
        assert!(matches!(session.rename_animation("idle", "walk"), Err(Error::DuplicateName(_))));
        session.rename_animation("idle", "rest").unwrap();
        assert!(session.animation("rest").is_some());
        session.remove_animation("rest").unwrap();
        assert_eq!(session.animations().len(), 1);
    }

    #[test]
    fn test_fonts() {
        let mut session = PackSession::default();
        let bdf = "STARTCHAR a\nENCODING 97\nBBX 8 2 0 0\nBITMAP\n3C\n42\nENDCHAR\n";
        let entry = session.add_font("tiny", "fonts/tiny.bdf", bdf.as_bytes()).unwrap();
        assert_eq!(entry.name(), "tiny");
        assert_eq!(entry.format(), FontFormat::Bdf);
        assert_eq!(entry.source_path(), Some(Path::new("fonts/tiny.bdf")));
        let font = FontAsset::decode(entry.encoded()).unwrap();
        assert_eq!(font.glyph(97).unwrap().bitmap.as_bytes(), &[0x3C, 0x42]);

        assert!(matches!(
            session.add_font("tiny", "other.bdf", bdf.as_bytes()),
            Err(Error::DuplicateName(_))
        ));
        assert!(session.add_font("x", "x.woff", b"").is_err());
        session.remove_font("tiny").unwrap();
        assert!(session.is_empty());
    }
}
