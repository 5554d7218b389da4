//! Pack archive assembly
//!
//! Layout of an exported pack:
//!
//! ```text
//! <pack>/Anims/manifest.txt
//! <pack>/Anims/<animation>/meta.txt
//! <pack>/Anims/<animation>/frame_<i>.bm
//! <pack>/Icons/<Category>/<icon>.bmx
//! <pack>/Fonts/<font>.u8f
//! ```

use crate::session::{AnimationAsset, AnimationMetadata, PackSession, FRAME_HEIGHT, FRAME_WIDTH};
use crate::{Error, Result};
use fzpack_core::{encode_bm_frame, encode_bmx, validate_bmx, Compression, PackedBitmap};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

/// Longest accepted pack name
pub const MAX_PACK_NAME_LEN: usize = 32;

/// Fixed manifest mood range
const MIN_BUTTHURT: i32 = 0;
const MAX_BUTTHURT: i32 = 13;

/// Which asset kinds go into the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub animations: bool,
    pub icons: bool,
    pub fonts: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            animations: true,
            icons: true,
            fonts: true,
        }
    }
}

/// An asset left out of the archive and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub path: String,
    pub reason: String,
}

/// What an export wrote and what it left out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub animations: usize,
    pub frames: usize,
    pub icons: usize,
    pub fonts: usize,
    pub excluded: Vec<Exclusion>,
}

impl ExportReport {
    fn exclude(&mut self, path: impl Into<String>, reason: impl ToString) {
        let path = path.into();
        let reason = reason.to_string();
        log::warn!("Excluding {path}: {reason}");
        self.excluded.push(Exclusion { path, reason });
    }
}

/// One file of the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub data: Vec<u8>,
}

/// The files of a pack in the order they are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackArchive {
    pack_name: String,
    entries: Vec<ArchiveEntry>,
}

/// Strips characters outside `[A-Za-z0-9_-]` and checks the length
pub fn sanitize_pack_name(name: &str) -> Result<String> {
    let sanitized: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if sanitized.is_empty() || sanitized.len() > MAX_PACK_NAME_LEN {
        return Err(Error::InvalidPackName(name.to_string()));
    }
    Ok(sanitized)
}

fn collision(name: &str, path: &str) -> Error {
    Error::PathCollision {
        name: name.to_string(),
        path: path.to_string(),
    }
}

/// Makes an asset name safe to use as a single path component
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "_".to_string()
    } else {
        stem
    }
}

impl PackArchive {
    /// Encodes every selected asset of the session into archive entries
    pub fn assemble(
        pack_name: &str,
        session: &PackSession,
        options: &ExportOptions,
    ) -> Result<(Self, ExportReport)> {
        let pack_name = sanitize_pack_name(pack_name)?;
        let mut archive = PackArchive {
            pack_name,
            entries: Vec::new(),
        };
        let mut report = ExportReport::default();

        if options.animations && !session.animations().is_empty() {
            archive.add_animations(session, &mut report);
        }
        if options.icons {
            archive.add_icons(session, &mut report);
        }
        if options.fonts {
            archive.add_fonts(session, &mut report);
        }

        log::info!(
            "Assembled pack '{}': {} animations ({} frames), {} icons, {} fonts, {} excluded",
            archive.pack_name,
            report.animations,
            report.frames,
            report.icons,
            report.fonts,
            report.excluded.len()
        );
        Ok((archive, report))
    }

    fn push(&mut self, path: String, data: Vec<u8>) {
        log::debug!("  {path} ({} bytes)", data.len());
        self.entries.push(ArchiveEntry { path, data });
    }

    fn add_animations(&mut self, session: &PackSession, report: &mut ExportReport) {
        let threshold = session.config().threshold;
        let mut folders = HashSet::new();
        let mut exported = Vec::new();

        for animation in session.animations() {
            let stem = file_stem(animation.name());
            let folder = format!("{}/Anims/{stem}", self.pack_name);
            if !folders.insert(stem.clone()) {
                report.exclude(folder.clone(), collision(animation.name(), &folder));
                continue;
            }

            let mut frames = 0;
            for (i, bitmap) in animation.bitmaps(threshold).iter().enumerate() {
                let path = format!("{folder}/frame_{frames}.bm");
                match encode_bm_frame(bitmap, Compression::None) {
                    Ok(data) => {
                        self.push(path, data);
                        frames += 1;
                    }
                    Err(e) => report.exclude(format!("{folder} frame {i}"), e),
                }
            }
            if frames == 0 {
                report.exclude(folder, Error::EmptyAnimation(animation.name().to_string()));
                continue;
            }
            self.push(format!("{folder}/meta.txt"), meta_text(animation, frames).into_bytes());
            report.animations += 1;
            report.frames += frames;
            exported.push((stem, animation.metadata()));
        }

        if !exported.is_empty() {
            let path = format!("{}/Anims/manifest.txt", self.pack_name);
            self.push(path, manifest_text(&exported).into_bytes());
        }
    }

    fn add_icons(&mut self, session: &PackSession, report: &mut ExportReport) {
        let mut paths = HashSet::new();
        for icon in session.icons() {
            let path = format!(
                "{}/Icons/{}/{}.bmx",
                self.pack_name,
                icon.category().folder_name(),
                file_stem(icon.name())
            );
            if !paths.insert(path.clone()) {
                report.exclude(path.clone(), collision(icon.name(), &path));
                continue;
            }
            self.push_icon(path, icon.bitmap(), report);
        }
    }

    /// Adds an icon only if its container passes validation
    fn push_icon(&mut self, path: String, bitmap: &PackedBitmap, report: &mut ExportReport) {
        let checked = encode_bmx(bitmap).and_then(|data| validate_bmx(&data).map(|_| data));
        match checked {
            Ok(data) => {
                self.push(path, data);
                report.icons += 1;
            }
            Err(e) => report.exclude(path, e),
        }
    }

    fn add_fonts(&mut self, session: &PackSession, report: &mut ExportReport) {
        let mut paths = HashSet::new();
        for entry in session.fonts() {
            let path = format!("{}/Fonts/{}.u8f", self.pack_name, file_stem(entry.name()));
            if !paths.insert(path.clone()) {
                report.exclude(path.clone(), collision(entry.name(), &path));
                continue;
            }
            self.push(path, entry.encoded().to_vec());
            report.fonts += 1;
        }
    }

    pub fn pack_name(&self) -> &str {
        &self.pack_name
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Data of the entry at `path`, relative to the archive root
    pub fn entry(&self, path: &str) -> Option<&[u8]> {
        self.entries.iter().find(|e| e.path == path).map(|e| e.data.as_slice())
    }

    /// Writes all entries as a zip archive, in assembly order
    pub fn write_zip<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut out = zip::ZipWriter::new(writer);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for entry in &self.entries {
            out.start_file(entry.path.as_str(), options)?;
            out.write_all(&entry.data)?;
        }
        Ok(out.finish()?)
    }

    pub fn to_zip_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_zip(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Writes the zip archive to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_zip(file)?;
        Ok(())
    }
}

/// Text descriptor of one animation
pub fn meta_text(animation: &AnimationAsset, frames: usize) -> String {
    let frame_rate = animation.frame_rate();
    let order: Vec<String> = (0..frames).map(|i| i.to_string()).collect();
    let duration = frames as u64 * 1000 / frame_rate as u64;

    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(out, "Filetype: Flipper Animation");
    let _ = writeln!(out, "Version: 1");
    let _ = writeln!(out);
    let _ = writeln!(out, "Width: {FRAME_WIDTH}");
    let _ = writeln!(out, "Height: {FRAME_HEIGHT}");
    let _ = writeln!(out, "Passive frames: {frames}");
    let _ = writeln!(out, "Active frames: 0");
    let _ = writeln!(out, "Frames order: {}", order.join(" "));
    let _ = writeln!(out, "Active cycles: 0");
    let _ = writeln!(out, "Frame rate: {frame_rate}");
    let _ = writeln!(out, "Duration: {duration}");
    let _ = writeln!(out, "Active cooldown: 0");
    let _ = writeln!(out);
    let _ = writeln!(out, "Bubble slots: 0");
    out
}

/// Manifest listing the animation folders and their selection metadata
pub fn manifest_text(animations: &[(String, AnimationMetadata)]) -> String {
    let mut out = String::from("Filetype: Flipper Animation Manifest\nVersion: 1\n");
    for (folder, metadata) in animations {
        let _ = writeln!(out);
        let _ = writeln!(out, "Name: {folder}");
        let _ = writeln!(out, "Min butthurt: {MIN_BUTTHURT}");
        let _ = writeln!(out, "Max butthurt: {MAX_BUTTHURT}");
        let _ = writeln!(out, "Min level: {}", metadata.min_level);
        let _ = writeln!(out, "Max level: {}", metadata.max_level);
        let _ = writeln!(out, "Weight: {}", metadata.weight);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageSource;
    use fzpack_core::{IconCategory, RasterImage};

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> ImageSource {
        RasterImage::filled(width, height, rgba).unwrap().into()
    }

    fn sample_session() -> PackSession {
        let mut session = PackSession::default();
        session
            .add_animation(
                "walk",
                vec![solid(128, 64, [0, 0, 0, 255]), solid(128, 64, [255, 255, 255, 255])],
            )
            .unwrap();
        session.add_icon("card", solid(8, 8, [0, 0, 0, 255]), IconCategory::Passport).unwrap();
        session
            .add_font(
                "tiny",
                "tiny.bdf",
                b"STARTCHAR a\nENCODING 97\nBBX 8 1 0 0\nBITMAP\nFF\nENDCHAR\n",
            )
            .unwrap();
        session
    }

    #[test]
    fn test_pack_names() {
        assert_eq!(sanitize_pack_name("My Pack!").unwrap(), "MyPack");
        assert_eq!(sanitize_pack_name("a_b-c").unwrap(), "a_b-c");
        assert!(matches!(sanitize_pack_name("!!!"), Err(Error::InvalidPackName(_))));
        assert!(sanitize_pack_name(&"x".repeat(33)).is_err());
        assert!(sanitize_pack_name(&"x".repeat(32)).is_ok());
    }

    #[test]
    fn test_layout() {
        let session = sample_session();
        let (archive, report) =
            PackArchive::assemble("pack", &session, &ExportOptions::default()).unwrap();
        let paths: Vec<&str> = archive.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "pack/Anims/walk/frame_0.bm",
                "pack/Anims/walk/frame_1.bm",
                "pack/Anims/walk/meta.txt",
                "pack/Anims/manifest.txt",
                "pack/Icons/Passport/card.bmx",
                "pack/Fonts/tiny.u8f",
            ]
        );
        assert_eq!(
            (report.animations, report.frames, report.icons, report.fonts),
            (1, 2, 1, 1)
        );
        assert!(report.excluded.is_empty());

        let frame = archive.entry("pack/Anims/walk/frame_0.bm").unwrap();
        assert_eq!(frame.len(), 1 + 16 * 64);
        assert_eq!(frame[0], 0x00);
        assert!(frame[1..].iter().all(|&b| b == 0xFF));
        assert!(archive.entry("pack/Anims/walk/frame_1.bm").unwrap()[1..].iter().all(|&b| b == 0));

        let icon = archive.entry("pack/Icons/Passport/card.bmx").unwrap();
        assert_eq!(validate_bmx(icon).unwrap().width, 46);
    }

    #[test]
    fn test_meta_and_manifest_text() {
        let session = sample_session();
        let (archive, _) =
            PackArchive::assemble("pack", &session, &ExportOptions::default()).unwrap();
        let text = |path: &str| String::from_utf8(archive.entry(path).unwrap().to_vec()).unwrap();

        let meta = text("pack/Anims/walk/meta.txt");
        assert!(meta.starts_with(
            "Filetype: Flipper Animation\nVersion: 1\n\nWidth: 128\nHeight: 64\n"
        ));
        assert!(meta.contains("Passive frames: 2\n"));
        assert!(meta.contains("Frames order: 0 1\n"));
        assert!(meta.contains("Frame rate: 5\n"));
        assert!(meta.contains("Duration: 400\n"));

        assert_eq!(
            text("pack/Anims/manifest.txt"),
            "Filetype: Flipper Animation Manifest
Version: 1

Name: walk
Min butthurt: 0
Max butthurt: 13
Min level: 1
Max level: 30
Weight: 1
"
        );
    }

    #[test]
    fn test_manifest_separates_animations() {
        let tuned = AnimationMetadata {
            min_level: 2,
            max_level: 3,
            weight: 4,
        };
        let manifest = manifest_text(&[
            ("a".to_string(), AnimationMetadata::default()),
            ("b".to_string(), tuned),
        ]);
        assert!(manifest.contains("Weight: 1\n\nName: b\n"));
        assert!(manifest.ends_with("Min level: 2\nMax level: 3\nWeight: 4\n"));
    }

    #[test]
    fn test_manifest_names_match_folders() {
        let mut session = PackSession::default();
        session
            .add_animation("my anim", vec![solid(128, 64, [0, 0, 0, 255])])
            .unwrap();
        let (archive, report) =
            PackArchive::assemble("p", &session, &ExportOptions::default()).unwrap();
        assert_eq!(report.animations, 1);
        assert!(archive.entry("p/Anims/my_anim/frame_0.bm").is_some());
        assert!(archive.entry("p/Anims/my_anim/meta.txt").is_some());

        let manifest = String::from_utf8(archive.entry("p/Anims/manifest.txt").unwrap().to_vec())
            .unwrap();
        assert!(manifest.contains("\nName: my_anim\n"));
        assert!(!manifest.contains("my anim"));
    }

    #[test]
    fn test_colliding_names_are_excluded() {
        let mut session = PackSession::default();
        let black = || solid(8, 8, [0, 0, 0, 255]);
        session.add_icon("a b", black(), IconCategory::Default).unwrap();
        session.add_icon("a_b", black(), IconCategory::Default).unwrap();
        // Both stems sanitize to "__"
        session.add_icon("日本", black(), IconCategory::Default).unwrap();
        session.add_icon("中文", black(), IconCategory::Default).unwrap();
        session
            .add_animation("walk cycle", vec![solid(128, 64, [0, 0, 0, 255])])
            .unwrap();
        session
            .add_animation("walk_cycle", vec![solid(128, 64, [255, 255, 255, 255])])
            .unwrap();
        let bdf: &[u8] = b"STARTCHAR a\nENCODING 97\nBBX 8 1 0 0\nBITMAP\nFF\nENDCHAR\n";
        session.add_font("tiny font", "a.bdf", bdf).unwrap();
        session.add_font("tiny/font", "b.bdf", bdf).unwrap();
        session.add_font("tiny_font", "c.bdf", bdf).unwrap();

        let (archive, report) =
            PackArchive::assemble("p", &session, &ExportOptions::default()).unwrap();
        assert_eq!(
            (report.animations, report.frames, report.icons, report.fonts),
            (1, 1, 2, 1)
        );
        let excluded: Vec<&str> = report.excluded.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            excluded,
            vec![
                "p/Anims/walk_cycle",
                "p/Icons/Default/a_b.bmx",
                "p/Icons/Default/__.bmx",
                "p/Fonts/tiny_font.u8f",
                "p/Fonts/tiny_font.u8f",
            ]
        );

        // The first asset keeps the path
        let frame = archive.entry("p/Anims/walk_cycle/frame_0.bm").unwrap();
        assert!(frame[1..].iter().all(|&b| b == 0xFF));
        let manifest = String::from_utf8(archive.entry("p/Anims/manifest.txt").unwrap().to_vec())
            .unwrap();
        assert_eq!(manifest.matches("Name: ").count(), 1);

        // Every path is unique, so the zip writes cleanly
        let bytes = archive.to_zip_bytes().unwrap();
        let reader = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.len(), archive.entries().len());
    }

    #[test]
    fn test_oversized_icon_is_excluded() {
        let mut archive = PackArchive {
            pack_name: "p".into(),
            entries: Vec::new(),
        };
        let mut report = ExportReport::default();
        let wide = PackedBitmap::new(200, 10);
        archive.push_icon("p/Icons/Default/wide.bmx".into(), &wide, &mut report);
        archive.push_icon("p/Icons/Default/ok.bmx".into(), &PackedBitmap::new(16, 16), &mut report);

        assert_eq!(archive.entries().len(), 1);
        assert_eq!(report.icons, 1);
        assert_eq!(report.excluded.len(), 1);
        assert_eq!(report.excluded[0].path, "p/Icons/Default/wide.bmx");
    }

    #[test]
    fn test_options_filter_kinds() {
        let session = sample_session();
        let options = ExportOptions {
            animations: false,
            icons: true,
            fonts: false,
        };
        let (archive, report) = PackArchive::assemble("p", &session, &options).unwrap();
        assert_eq!(archive.entries().len(), 1);
        assert_eq!((report.animations, report.icons, report.fonts), (0, 1, 0));
    }

    #[test]
    fn test_empty_session_has_no_manifest() {
        let session = PackSession::default();
        let (archive, _) = PackArchive::assemble("p", &session, &ExportOptions::default()).unwrap();
        assert!(archive.entries().is_empty());
    }

    #[test]
    fn test_zip_output() {
        let session = sample_session();
        let (archive, _) =
            PackArchive::assemble("pack", &session, &ExportOptions::default()).unwrap();
        let bytes = archive.to_zip_bytes().unwrap();
        let mut reader = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.len(), archive.entries().len());
        let mut file = reader.by_name("pack/Fonts/tiny.u8f").unwrap();
        let mut data = Vec::new();
        std::io::Read::read_to_end(&mut file, &mut data).unwrap();
        assert_eq!(data, session.font("tiny").unwrap().encoded());
    }
}
