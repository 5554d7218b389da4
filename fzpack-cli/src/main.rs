//! fzpack CLI Tool
//!
//! Command-line interface for building and inspecting fzpack asset packs.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use flexi_logger::Logger;
use fzpack_core::{
    decode_bmx, encode_bm_frame, encode_bmx, validate_bmx, Compression, FontAsset, IconCategory,
};
use fzpack_decoder::{
    bitmap_to_image, decode_bm_frame_image, render_font_sheet, scale_image, PackReader,
};
use fzpack_encoder::archive::meta_text;
use fzpack_encoder::{
    EncoderConfig, ExportOptions, FontFormat, ImageSource, PackArchive, PackSession,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fzpack")]
#[command(about = "fzpack - Monochrome icon, animation and font packs for 128x64 displays")]
#[command(version)]
struct Cli {
    /// TOML file with encoder settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an image into a BMX icon
    Icon {
        /// Input image file path
        input: PathBuf,

        /// Output BMX file path
        #[arg(short, long)]
        output: PathBuf,

        /// Icon category; decides the canvas size
        #[arg(long, default_value = "Default")]
        category: IconCategory,

        /// Resize to WIDTHxHEIGHT instead of the category size
        #[arg(long, value_parser = parse_size)]
        size: Option<(u32, u32)>,

        /// Luminance threshold (0-255)
        #[arg(long)]
        threshold: Option<u8>,

        /// Also write a PNG preview of the packed bitmap
        #[arg(long)]
        preview: Option<PathBuf>,
    },

    /// Convert images into animation frames and a meta.txt
    Anim {
        /// Frame images in playback order
        #[arg(required = true)]
        frames: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Frames per second
        #[arg(long)]
        frame_rate: Option<u32>,

        /// Stretch frames to 128x64 instead of letterboxing
        #[arg(long)]
        stretch: bool,

        /// Luminance threshold (0-255)
        #[arg(long)]
        threshold: Option<u8>,
    },

    /// Convert a C array, BDF, PCF or TTF/OTF font into a glyph table
    Font {
        /// Input font file path
        input: PathBuf,

        /// Output glyph table path
        #[arg(short, long)]
        output: PathBuf,

        /// Pixel size for outline fonts
        #[arg(long)]
        pixel_size: Option<u32>,

        /// Also write a PNG glyph sheet
        #[arg(long)]
        preview: Option<PathBuf>,
    },

    /// Build a pack archive
    Pack {
        /// Pack name, the root folder of the archive
        #[arg(short, long)]
        name: String,

        /// Output zip file path
        #[arg(short, long)]
        output: PathBuf,

        /// Icon as CATEGORY=PATH; may be repeated
        #[arg(long = "icon", value_parser = parse_icon)]
        icons: Vec<(IconCategory, PathBuf)>,

        /// Directory of frame images, one animation each; may be repeated
        #[arg(long = "anim")]
        anims: Vec<PathBuf>,

        /// Font source file; may be repeated
        #[arg(long = "font")]
        fonts: Vec<PathBuf>,

        /// Frames per second for every animation
        #[arg(long)]
        frame_rate: Option<u32>,
    },

    /// Render a BMX, BM frame or glyph table as PNG
    Decode {
        /// Input file (.bmx, .bm or .u8f)
        input: PathBuf,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// Frame size for .bm files
        #[arg(long, value_parser = parse_size, default_value = "128x64")]
        size: (u32, u32),

        /// Integer upscale factor
        #[arg(long, default_value = "4")]
        scale: u32,

        /// Glyphs per row for font sheets
        #[arg(long, default_value = "16")]
        columns: u32,
    },

    /// Show the contents of a pack archive and validate it
    Info {
        /// Pack zip file path
        input: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show details of a single asset file
    Inspect {
        /// A .bmx icon or any supported font file
        input: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let _logger = Logger::try_with_env_or_str(level)
        .context("Invalid log level")?
        .start()
        .context("Failed to start logger")?;

    let config = match &cli.config {
        Some(path) => EncoderConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EncoderConfig::default(),
    };
    log::debug!("Encoder config: {config:?}");

    match cli.command {
        Commands::Icon {
            input,
            output,
            category,
            size,
            threshold,
            preview,
        } => {
            let config = EncoderConfig {
                threshold: threshold.unwrap_or(config.threshold),
                ..config
            };
            encode_icon(config, &input, &output, category, size, preview.as_deref())?
        }

        Commands::Anim {
            frames,
            output,
            frame_rate,
            stretch,
            threshold,
        } => {
            let config = EncoderConfig {
                frame_rate: frame_rate.unwrap_or(config.frame_rate),
                threshold: threshold.unwrap_or(config.threshold),
                preserve_aspect: config.preserve_aspect && !stretch,
                ..config
            };
            encode_animation(config, &frames, &output)?
        }

        Commands::Font {
            input,
            output,
            pixel_size,
            preview,
        } => {
            let config = EncoderConfig {
                font_pixel_size: pixel_size.unwrap_or(config.font_pixel_size),
                ..config
            };
            encode_font(config, &input, &output, preview.as_deref())?
        }

        Commands::Pack {
            name,
            output,
            icons,
            anims,
            fonts,
            frame_rate,
        } => {
            let config = EncoderConfig {
                frame_rate: frame_rate.unwrap_or(config.frame_rate),
                ..config
            };
            build_pack(config, &name, &output, &icons, &anims, &fonts)?
        }

        Commands::Decode {
            input,
            output,
            size,
            scale,
            columns,
        } => decode_file(&input, &output, size, scale, columns)?,

        Commands::Info { input, json } => pack_info(&input, json)?,

        Commands::Inspect { input, json } => inspect_file(config, &input, json)?,
    }

    Ok(())
}

fn parse_size(value: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let w = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let h = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    Ok((w, h))
}

fn parse_icon(value: &str) -> std::result::Result<(IconCategory, PathBuf), String> {
    let (category, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY=PATH, got '{value}'"))?;
    let category = category.parse::<IconCategory>().map_err(|e| e.to_string())?;
    Ok((category, PathBuf::from(path)))
}

/// Asset name derived from a file name
fn asset_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".to_string())
}

/// Image files of a directory sorted by file name
fn frame_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| image::ImageFormat::from_extension(e).is_some());
        if path.is_file() && is_image {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn load_sources(paths: &[PathBuf]) -> Result<Vec<ImageSource>> {
    paths
        .iter()
        .map(|p| {
            ImageSource::from_path(p).with_context(|| format!("Failed to read {}", p.display()))
        })
        .collect()
}

fn encode_icon(
    config: EncoderConfig,
    input: &Path,
    output: &Path,
    category: IconCategory,
    size: Option<(u32, u32)>,
    preview: Option<&Path>,
) -> Result<()> {
    println!("Encoding icon: {}", input.display());

    let name = asset_name(input);
    let mut session = PackSession::new(config);
    let source = ImageSource::from_path(input).context("Failed to read input image")?;
    session
        .add_icon(&name, source, category)
        .context("Failed to convert icon")?;
    if let Some((width, height)) = size {
        session
            .resize_icon(&name, width, height, false)
            .context("Failed to resize icon")?;
    }
    let icon = session.icon(&name).context("Icon missing from session")?;

    let data = encode_bmx(icon.bitmap()).context("Failed to encode BMX")?;
    std::fs::write(output, &data).context("Failed to write output file")?;
    println!(
        "Wrote {}x{} {} icon to {} ({} bytes)",
        icon.bitmap().width(),
        icon.bitmap().height(),
        icon.category(),
        output.display(),
        data.len()
    );

    if let Some(preview) = preview {
        scale_image(&bitmap_to_image(icon.bitmap()), 4)
            .save(preview)
            .context("Failed to save preview")?;
        println!("Saved preview to {}", preview.display());
    }
    Ok(())
}

fn encode_animation(config: EncoderConfig, frames: &[PathBuf], output: &Path) -> Result<()> {
    println!("Encoding animation from {} frames", frames.len());

    let name = asset_name(output);
    let threshold = config.threshold;
    let mut session = PackSession::new(config);
    session
        .add_animation(&name, load_sources(frames)?)
        .context("Failed to convert frames")?;
    let animation = session.animation(&name).context("Animation missing from session")?;

    std::fs::create_dir_all(output).context("Failed to create output directory")?;
    for (i, bitmap) in animation.bitmaps(threshold).iter().enumerate() {
        let data = encode_bm_frame(bitmap, Compression::None).context("Failed to encode frame")?;
        std::fs::write(output.join(format!("frame_{i}.bm")), data)
            .context("Failed to write frame")?;
    }
    std::fs::write(output.join("meta.txt"), meta_text(animation, animation.frame_count()))
        .context("Failed to write meta.txt")?;

    println!(
        "Wrote {} frames at {} fps ({} ms) to {}",
        animation.frame_count(),
        animation.frame_rate(),
        animation.duration_ms(),
        output.display()
    );
    Ok(())
}

fn encode_font(
    config: EncoderConfig,
    input: &Path,
    output: &Path,
    preview: Option<&Path>,
) -> Result<()> {
    println!("Converting font: {}", input.display());

    let bytes = std::fs::read(input).context("Failed to read font file")?;
    let name = asset_name(input);
    let mut session = PackSession::new(config);
    let entry = session
        .add_font(&name, input, &bytes)
        .context("Failed to import font")?;

    std::fs::write(output, entry.encoded()).context("Failed to write output file")?;
    println!(
        "Wrote {} glyphs from {} source to {} ({} bytes)",
        entry.font().len(),
        entry.format(),
        output.display(),
        entry.encoded().len()
    );

    if let Some(preview) = preview {
        render_font_sheet(entry.font(), 16, 4)
            .context("Failed to render glyph sheet")?
            .save(preview)
            .context("Failed to save preview")?;
        println!("Saved glyph sheet to {}", preview.display());
    }
    Ok(())
}

fn build_pack(
    config: EncoderConfig,
    name: &str,
    output: &Path,
    icons: &[(IconCategory, PathBuf)],
    anims: &[PathBuf],
    fonts: &[PathBuf],
) -> Result<()> {
    println!("Building pack: {name}");

    let mut session = PackSession::new(config);
    for (category, path) in icons {
        let source = ImageSource::from_path(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        session
            .add_icon(&asset_name(path), source, *category)
            .with_context(|| format!("Failed to add icon {}", path.display()))?;
    }
    for dir in anims {
        let frames = frame_files(dir)?;
        if frames.is_empty() {
            bail!("No frame images in {}", dir.display());
        }
        session
            .add_animation(&asset_name(dir), load_sources(&frames)?)
            .with_context(|| format!("Failed to add animation {}", dir.display()))?;
    }
    for path in fonts {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        session
            .add_font(&asset_name(path), path, &bytes)
            .with_context(|| format!("Failed to add font {}", path.display()))?;
    }
    if session.is_empty() {
        bail!("Nothing to pack: pass --icon, --anim or --font");
    }

    let (archive, report) = PackArchive::assemble(name, &session, &ExportOptions::default())
        .context("Failed to assemble pack")?;
    archive.save(output).context("Failed to write pack archive")?;

    println!(
        "Packed {} animations ({} frames), {} icons and {} fonts into {}",
        report.animations,
        report.frames,
        report.icons,
        report.fonts,
        output.display()
    );
    for excluded in &report.excluded {
        println!("  excluded {}: {}", excluded.path, excluded.reason);
    }
    Ok(())
}

fn decode_file(
    input: &Path,
    output: &Path,
    size: (u32, u32),
    scale: u32,
    columns: u32,
) -> Result<()> {
    let bytes = std::fs::read(input).context("Failed to read input file")?;
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let image = match ext.as_str() {
        "bmx" => bitmap_to_image(&decode_bmx(&bytes).context("Invalid BMX file")?.bitmap),
        "bm" => decode_bm_frame_image(&bytes, size.0, size.1).context("Invalid BM frame")?,
        "u8f" => {
            let font = FontAsset::decode(&bytes).context("Invalid glyph table")?;
            render_font_sheet(&font, columns, 1).context("Failed to render glyph sheet")?
        }
        other => bail!("Don't know how to decode '.{other}' files"),
    };

    scale_image(&image, scale)
        .save(output)
        .context("Failed to save image")?;
    println!("Saved {} to {}", input.display(), output.display());
    Ok(())
}

#[derive(serde::Serialize)]
struct PackInfo {
    pack: String,
    animations: Vec<AnimationInfo>,
    icons: Vec<IconInfo>,
    fonts: Vec<FontInfo>,
    problems: Vec<ProblemInfo>,
}

#[derive(serde::Serialize)]
struct AnimationInfo {
    name: String,
    frames: Option<usize>,
    frame_rate: Option<u32>,
    duration_ms: Option<u64>,
}

#[derive(serde::Serialize)]
struct IconInfo {
    category: String,
    name: String,
    width: Option<i32>,
    height: Option<i32>,
}

#[derive(serde::Serialize)]
struct FontInfo {
    name: String,
    glyphs: Option<usize>,
}

#[derive(serde::Serialize)]
struct ProblemInfo {
    path: String,
    reason: String,
}

fn pack_info(input: &Path, json: bool) -> Result<()> {
    let reader = PackReader::open(input).context("Failed to open pack archive")?;

    let animations = reader
        .animations()
        .into_iter()
        .map(|name| {
            let meta = reader.animation_meta(&name).ok();
            AnimationInfo {
                frames: meta.map(|m| m.frames),
                frame_rate: meta.map(|m| m.frame_rate),
                duration_ms: meta.map(|m| m.duration_ms),
                name,
            }
        })
        .collect();
    let icons = reader
        .icons()
        .into_iter()
        .map(|icon| {
            let header = reader.entry(&icon.path).and_then(|data| validate_bmx(data).ok());
            IconInfo {
                width: header.map(|h| h.width),
                height: header.map(|h| h.height),
                category: icon.category,
                name: icon.name,
            }
        })
        .collect();
    let fonts = reader
        .fonts()
        .into_iter()
        .map(|name| FontInfo {
            glyphs: reader.font(&name).ok().map(|f| f.len()),
            name,
        })
        .collect();
    let problems = reader
        .validate()
        .into_iter()
        .map(|p| ProblemInfo {
            path: p.path,
            reason: p.reason,
        })
        .collect();

    let info = PackInfo {
        pack: reader.pack_name().to_string(),
        animations,
        icons,
        fonts,
        problems,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("\n=== Pack: {} ===", info.pack);
    println!("\n=== Animations ({}) ===", info.animations.len());
    for anim in &info.animations {
        match (anim.frames, anim.frame_rate, anim.duration_ms) {
            (Some(frames), Some(rate), Some(duration)) => {
                println!("  {}: {} frames @ {} fps, {} ms", anim.name, frames, rate, duration)
            }
            _ => println!("  {}: unreadable meta.txt", anim.name),
        }
    }
    println!("\n=== Icons ({}) ===", info.icons.len());
    for icon in &info.icons {
        match (icon.width, icon.height) {
            (Some(w), Some(h)) => println!("  {}/{}: {}x{}", icon.category, icon.name, w, h),
            _ => println!("  {}/{}: invalid", icon.category, icon.name),
        }
    }
    println!("\n=== Fonts ({}) ===", info.fonts.len());
    for font in &info.fonts {
        match font.glyphs {
            Some(glyphs) => println!("  {}: {} glyphs", font.name, glyphs),
            None => println!("  {}: invalid", font.name),
        }
    }
    if info.problems.is_empty() {
        println!("\nAll entries valid");
    } else {
        println!("\n=== Problems ({}) ===", info.problems.len());
        for problem in &info.problems {
            println!("  {}: {}", problem.path, problem.reason);
        }
    }
    Ok(())
}

fn inspect_file(config: EncoderConfig, input: &Path, json: bool) -> Result<()> {
    let bytes = std::fs::read(input).context("Failed to read input file")?;
    let is_bmx = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("bmx"));

    if is_bmx {
        let decoded = decode_bmx(&bytes).context("Invalid BMX file")?;
        let meta = fzpack_core::MetaRecord::for_icon(decoded.width, decoded.height);
        if json {
            println!("{}", serde_json::to_string_pretty(&meta)?);
        } else {
            println!("BMX icon {}x{}", decoded.width, decoded.height);
            println!("  set pixels: {}", decoded.bitmap.count_set());
            let fits: Vec<String> = IconCategory::ALL
                .iter()
                .filter(|c| c.accepts_size(decoded.width, decoded.height))
                .map(|c| c.to_string())
                .collect();
            println!("  fits categories: {}", fits.join(", "));
        }
        return Ok(());
    }

    let format = FontFormat::from_path(input).context("Unsupported file type")?;
    let font =
        fzpack_encoder::import_font(&asset_name(input), &bytes, format, config.font_pixel_size)
            .context("Failed to read font")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&font.properties)?);
        return Ok(());
    }

    let props = &font.properties;
    println!("{} font '{}'", format, font.name);
    println!("  glyphs: {}", font.len());
    println!(
        "  bounding box: {}x{} at ({}, {})",
        props.bounding_box.width,
        props.bounding_box.height,
        props.bounding_box.x_offset,
        props.bounding_box.y_offset
    );
    println!(
        "  ascent: {}, descent: {}, line spacing: {}",
        props.ascent, props.descent, props.line_spacing
    );
    let codes: Vec<u32> = font.glyphs().iter().map(|g| g.code).collect();
    if let (Some(first), Some(last)) = (codes.iter().min(), codes.iter().max()) {
        println!("  codes: {first}..={last}");
    }
    Ok(())
}
