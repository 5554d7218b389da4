//! Reading exported pack archives

use crate::bitmap_decoder::{decode_bm_frame_image, decode_bmx_image};
use crate::{Error, Result};
use fzpack_core::{decode_bm_frame, validate_bmx, FontAsset};
use image::RgbaImage;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// An icon stored in the pack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconEntry {
    pub category: String,
    pub name: String,
    pub path: String,
}

/// The fields of an animation's meta.txt that decoding needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationMeta {
    pub width: u32,
    pub height: u32,
    pub frames: usize,
    pub frame_rate: u32,
    pub duration_ms: u64,
}

/// One animation block of manifest.txt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub name: String,
    pub min_level: i32,
    pub max_level: i32,
    pub weight: i32,
}

/// An entry that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryProblem {
    pub path: String,
    pub reason: String,
}

/// All files of an exported pack, held in memory
#[derive(Debug, Clone)]
pub struct PackReader {
    pack_name: String,
    entries: Vec<(String, Vec<u8>)>,
}

impl PackReader {
    /// Opens a pack archive from a file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Reads a pack archive from any seekable source
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push((file.name().to_string(), data));
        }

        let pack_name = entries
            .first()
            .and_then(|(path, _)| path.split('/').next())
            .unwrap_or_default()
            .to_string();
        log::debug!("Read pack '{pack_name}' with {} entries", entries.len());
        Ok(Self { pack_name, entries })
    }

    pub fn pack_name(&self) -> &str {
        &self.pack_name
    }

    /// Paths of every file in the pack
    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(path, _)| path.as_str())
    }

    /// Data of the file at `relative`, a path below the pack folder
    pub fn entry(&self, relative: &str) -> Option<&[u8]> {
        let full = format!("{}/{relative}", self.pack_name);
        self.entries
            .iter()
            .find(|(path, _)| *path == full)
            .map(|(_, data)| data.as_slice())
    }

    fn require(&self, relative: &str) -> Result<&[u8]> {
        self.entry(relative)
            .ok_or_else(|| Error::MissingEntry(format!("{}/{relative}", self.pack_name)))
    }

    /// Path components below the pack folder
    fn relative_parts(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        self.entries.iter().filter_map(|(path, _)| {
            let rest = path.strip_prefix(self.pack_name.as_str())?.strip_prefix('/')?;
            Some(rest.split('/').collect())
        })
    }

    pub fn icons(&self) -> Vec<IconEntry> {
        self.relative_parts()
            .filter_map(|parts| match parts.as_slice() {
                ["Icons", category, file] => Some(IconEntry {
                    category: category.to_string(),
                    name: file.strip_suffix(".bmx")?.to_string(),
                    path: parts.join("/"),
                }),
                _ => None,
            })
            .collect()
    }

    /// Names of animations that have a meta.txt
    pub fn animations(&self) -> Vec<String> {
        self.relative_parts()
            .filter_map(|parts| match parts.as_slice() {
                ["Anims", name, "meta.txt"] => Some(name.to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn fonts(&self) -> Vec<String> {
        self.relative_parts()
            .filter_map(|parts| match parts.as_slice() {
                ["Fonts", file] => file.strip_suffix(".u8f").map(str::to_string),
                _ => None,
            })
            .collect()
    }

    pub fn animation_meta(&self, name: &str) -> Result<AnimationMeta> {
        let data = self.require(&format!("Anims/{name}/meta.txt"))?;
        let text = String::from_utf8_lossy(data).into_owned();
        let fields = parse_fields(&text);
        let field = |key: &str| -> Result<u64> {
            let value = fields
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
                .ok_or_else(|| invalid_meta(name, format!("missing '{key}'")))?;
            value
                .parse()
                .map_err(|_| invalid_meta(name, format!("'{key}' is not a number: {value}")))
        };

        let meta = AnimationMeta {
            width: field("Width")? as u32,
            height: field("Height")? as u32,
            frames: field("Passive frames")? as usize,
            frame_rate: field("Frame rate")? as u32,
            duration_ms: field("Duration")?,
        };
        if meta.frames == 0 || meta.frame_rate == 0 {
            return Err(invalid_meta(name, "no frames or zero frame rate".into()));
        }
        Ok(meta)
    }

    pub fn manifest(&self) -> Result<Vec<ManifestEntry>> {
        let text = String::from_utf8_lossy(self.require("Anims/manifest.txt")?).into_owned();
        let mut entries = Vec::new();
        let mut current: Option<ManifestEntry> = None;
        for (key, value) in parse_fields(&text) {
            let number = || value.parse::<i32>().ok();
            match key {
                "Name" => {
                    entries.extend(current.take());
                    current = Some(ManifestEntry {
                        name: value.to_string(),
                        min_level: 0,
                        max_level: 0,
                        weight: 0,
                    });
                }
                "Min level" => current.iter_mut().for_each(|e| e.min_level = number().unwrap_or(0)),
                "Max level" => current.iter_mut().for_each(|e| e.max_level = number().unwrap_or(0)),
                "Weight" => current.iter_mut().for_each(|e| e.weight = number().unwrap_or(0)),
                _ => {}
            }
        }
        entries.extend(current);
        Ok(entries)
    }

    pub fn decode_icon(&self, icon: &IconEntry) -> Result<RgbaImage> {
        decode_bmx_image(self.require(&icon.path)?)
    }

    /// Decodes every frame of an animation in order
    pub fn decode_frames(&self, name: &str) -> Result<Vec<RgbaImage>> {
        let meta = self.animation_meta(name)?;
        (0..meta.frames)
            .map(|i| {
                let data = self.require(&format!("Anims/{name}/frame_{i}.bm"))?;
                decode_bm_frame_image(data, meta.width, meta.height)
            })
            .collect()
    }

    pub fn font(&self, name: &str) -> Result<FontAsset> {
        let mut font = FontAsset::decode(self.require(&format!("Fonts/{name}.u8f"))?)?;
        font.name = name.to_string();
        Ok(font)
    }

    /// Checks every icon, animation and font; returns what failed
    pub fn validate(&self) -> Vec<EntryProblem> {
        let mut problems = Vec::new();
        let mut report = |path: String, reason: String| {
            log::warn!("{path}: {reason}");
            problems.push(EntryProblem { path, reason });
        };

        for icon in self.icons() {
            if let Err(e) = self.require(&icon.path).and_then(|data| Ok(validate_bmx(data)?)) {
                report(icon.path, e.to_string());
            }
        }
        for name in self.animations() {
            let meta = match self.animation_meta(&name) {
                Ok(meta) => meta,
                Err(e) => {
                    report(format!("Anims/{name}/meta.txt"), e.to_string());
                    continue;
                }
            };
            for i in 0..meta.frames {
                let path = format!("Anims/{name}/frame_{i}.bm");
                let checked = self
                    .require(&path)
                    .and_then(|data| Ok(decode_bm_frame(data, meta.width, meta.height)?));
                if let Err(e) = checked {
                    report(path, e.to_string());
                }
            }
        }
        for name in self.fonts() {
            if let Err(e) = self.font(&name) {
                report(format!("Fonts/{name}.u8f"), e.to_string());
            }
        }
        problems
    }
}

fn invalid_meta(name: &str, reason: String) -> Error {
    Error::InvalidMeta {
        name: name.to_string(),
        reason,
    }
}

/// Splits `Key: value` lines; other lines are ignored
fn parse_fields(text: &str) -> Vec<(&str, &str)> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect()
}
