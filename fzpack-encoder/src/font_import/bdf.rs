//! BDF (Glyph Bitmap Distribution Format) text fonts

use fzpack_core::{BoundingBox, FontAsset, GlyphRecord, PackedBitmap};

/// Where the line scanner currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Idle,
    InCharHeader,
    InBitmapBody,
}

/// A glyph between STARTCHAR and ENDCHAR
#[derive(Debug, Default)]
struct PendingGlyph {
    name: String,
    code: Option<i64>,
    bbox: Option<BoundingBox>,
    rows: Vec<Vec<u8>>,
}

/// Line-oriented BDF reader
#[derive(Debug)]
pub struct BdfParser {
    state: ParseState,
    font: FontAsset,
    font_bbox: Option<BoundingBox>,
    ascent: Option<i32>,
    descent: Option<i32>,
    pending: PendingGlyph,
    skipped: usize,
}

impl Default for BdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl BdfParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::Idle,
            font: FontAsset::default(),
            font_bbox: None,
            ascent: None,
            descent: None,
            pending: PendingGlyph::default(),
            skipped: 0,
        }
    }

    /// Feeds one line of BDF text
    pub fn feed_line(&mut self, line: &str) {
        let line = line.trim();
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            return;
        };
        let args: Vec<&str> = parts.collect();

        match (self.state, keyword) {
            (ParseState::Idle, "FONT") => self.font.name = args.join(" "),
            (ParseState::Idle, "FONTBOUNDINGBOX") => self.font_bbox = parse_bbox(&args),
            (ParseState::Idle, "FONT_ASCENT") => self.ascent = parse_first(&args),
            (ParseState::Idle, "FONT_DESCENT") => self.descent = parse_first(&args),
            (_, "STARTCHAR") => {
                if self.state != ParseState::Idle {
                    log::warn!("STARTCHAR inside glyph '{}', dropping it", self.pending.name);
                    self.skipped += 1;
                }
                self.pending = PendingGlyph {
                    name: args.join(" "),
                    ..Default::default()
                };
                self.state = ParseState::InCharHeader;
            }
            (ParseState::InCharHeader, "ENCODING") => {
                self.pending.code = parse_first(&args);
            }
            (ParseState::InCharHeader, "BBX") => self.pending.bbox = parse_bbox(&args),
            (ParseState::InCharHeader, "BITMAP") => {
                self.pending.rows.clear();
                self.state = ParseState::InBitmapBody;
            }
            (ParseState::InCharHeader | ParseState::InBitmapBody, "ENDCHAR") => {
                self.commit();
                self.state = ParseState::Idle;
            }
            (ParseState::InBitmapBody, _) => match parse_hex_row(keyword) {
                Some(row) => self.pending.rows.push(row),
                None => {
                    log::debug!("Ignoring non-hex line in glyph '{}': {line}", self.pending.name)
                }
            },
            _ => {}
        }
    }

    fn commit(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let code = match pending.code {
            Some(code) if code >= 0 => code as u32,
            _ => {
                log::debug!("Skipping unencoded glyph '{}'", pending.name);
                self.skipped += 1;
                return;
            }
        };
        let Some(bbox) = pending.bbox.or(self.font_bbox) else {
            log::warn!("Glyph '{}' has no bounding box, skipping", pending.name);
            self.skipped += 1;
            return;
        };

        let stride = PackedBitmap::row_stride_for(bbox.width);
        let mut data = Vec::with_capacity(stride * bbox.height as usize);
        for y in 0..bbox.height as usize {
            let row = pending.rows.get(y).map(Vec::as_slice).unwrap_or(&[]);
            data.extend((0..stride).map(|i| row.get(i).copied().unwrap_or(0)));
        }
        if pending.rows.len() != bbox.height as usize {
            log::debug!(
                "Glyph '{}' has {} rows for a height of {}",
                pending.name,
                pending.rows.len(),
                bbox.height
            );
        }

        match PackedBitmap::from_bytes(bbox.width, bbox.height, data) {
            Ok(bitmap) => self
                .font
                .insert_glyph(GlyphRecord::new(code, bbox.x_offset, bbox.y_offset, bitmap)),
            Err(e) => {
                log::warn!("Glyph '{}' is malformed: {e}", pending.name);
                self.skipped += 1;
            }
        }
    }

    /// Number of glyphs dropped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Completes parsing and returns the font
    pub fn finish(mut self) -> FontAsset {
        if self.state != ParseState::Idle {
            log::warn!("BDF ended inside glyph '{}', dropping it", self.pending.name);
            self.skipped += 1;
        }

        let bbox = self.font_bbox.unwrap_or_else(|| self.font.compute_bounds());
        let descent = self.descent.unwrap_or(-bbox.y_offset).max(0);
        let ascent = self.ascent.unwrap_or(bbox.height as i32 + bbox.y_offset).max(0);
        self.font.properties.bounding_box = bbox;
        self.font.properties.ascent = ascent;
        self.font.properties.descent = descent;
        self.font.properties.line_spacing = (bbox.height as i32 - ascent - descent).max(0);

        log::debug!(
            "Parsed BDF font '{}': {} glyphs, {} skipped",
            self.font.name,
            self.font.len(),
            self.skipped
        );
        self.font
    }
}

/// Parses BDF text into a font
pub fn parse_bdf(text: &str) -> FontAsset {
    let mut parser = BdfParser::new();
    for line in text.lines() {
        parser.feed_line(line);
    }
    parser.finish()
}

fn parse_first<T: std::str::FromStr>(args: &[&str]) -> Option<T> {
    args.first()?.parse().ok()
}

fn parse_bbox(args: &[&str]) -> Option<BoundingBox> {
    let [w, h, x, y] = args.get(..4)? else {
        return None;
    };
    Some(BoundingBox {
        width: w.parse().ok()?,
        height: h.parse().ok()?,
        x_offset: x.parse().ok()?,
        y_offset: y.parse().ok()?,
    })
}

/// Decodes a hex row; an odd trailing digit is the high nibble of the last byte
fn parse_hex_row(text: &str) -> Option<Vec<u8>> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    text.as_bytes()
        .chunks(2)
        .map(|pair| {
            let digits = std::str::from_utf8(pair).ok()?;
            let value = u8::from_str_radix(digits, 16).ok()?;
            Some(if pair.len() == 1 { value << 4 } else { value })
        })
        .collect()
}
