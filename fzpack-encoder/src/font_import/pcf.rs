//! PCF (Portable Compiled Format) binary fonts
//!
//! A PCF file is a table of contents followed by tables. Every table starts
//! with its own format word, which decides the byte order of its integers and,
//! for bitmaps, the bit order, row padding and scan unit. Parsed fonts are
//! re-serialized as BDF text and handed to the BDF reader.

use crate::{Error, Result};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use fzpack_core::{FontAsset, PackedBitmap};
use std::fmt::Write as _;
use std::io::{self, Cursor, Read};

use super::bdf::parse_bdf;

const PCF_MAGIC: [u8; 4] = [0x01, b'f', b'c', b'p'];

const PCF_PROPERTIES: u32 = 1 << 0;
const PCF_ACCELERATORS: u32 = 1 << 1;
const PCF_METRICS: u32 = 1 << 2;
const PCF_BITMAPS: u32 = 1 << 3;
const PCF_BDF_ENCODINGS: u32 = 1 << 5;
const PCF_BDF_ACCELERATORS: u32 = 1 << 8;

const PCF_FORMAT_MASK: u32 = 0xFFFF_FF00;
const PCF_COMPRESSED_METRICS: u32 = 0x0000_0100;
const PCF_GLYPH_PAD_MASK: u32 = 3;
const PCF_BYTE_MASK: u32 = 1 << 2;
const PCF_BIT_MASK: u32 = 1 << 3;
const PCF_SCAN_UNIT_MASK: u32 = 3 << 4;

/// Marks an unused slot in the encodings table
const NO_GLYPH: u16 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TableFormat(u32);

impl TableFormat {
    fn big_endian(self) -> bool {
        self.0 & PCF_BYTE_MASK != 0
    }

    fn msb_bit_first(self) -> bool {
        self.0 & PCF_BIT_MASK != 0
    }

    fn pad_index(self) -> usize {
        (self.0 & PCF_GLYPH_PAD_MASK) as usize
    }

    fn glyph_pad(self) -> usize {
        1 << self.pad_index()
    }

    fn scan_unit(self) -> usize {
        1 << ((self.0 & PCF_SCAN_UNIT_MASK) >> 4)
    }

    fn is(self, variant: u32) -> bool {
        self.0 & PCF_FORMAT_MASK == variant
    }
}

#[derive(Debug, Clone, Copy)]
struct TocEntry {
    kind: u32,
    size: u32,
    offset: u32,
}

/// Reads integers of one table in that table's byte order
struct TableReader<'a> {
    cursor: Cursor<&'a [u8]>,
    format: TableFormat,
}

impl<'a> TableReader<'a> {
    fn open(data: &'a [u8], entry: &TocEntry) -> io::Result<Self> {
        let start = entry.offset as usize;
        let end = start
            .checked_add(entry.size as usize)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "table extends past end of file")
            })?;
        let mut cursor = Cursor::new(&data[start..end]);
        let format = TableFormat(cursor.read_u32::<LittleEndian>()?);
        Ok(Self { cursor, format })
    }

    fn i32(&mut self) -> io::Result<i32> {
        if self.format.big_endian() {
            self.cursor.read_i32::<BigEndian>()
        } else {
            self.cursor.read_i32::<LittleEndian>()
        }
    }

    fn i16(&mut self) -> io::Result<i16> {
        if self.format.big_endian() {
            self.cursor.read_i16::<BigEndian>()
        } else {
            self.cursor.read_i16::<LittleEndian>()
        }
    }

    fn u16(&mut self) -> io::Result<u16> {
        if self.format.big_endian() {
            self.cursor.read_u16::<BigEndian>()
        } else {
            self.cursor.read_u16::<LittleEndian>()
        }
    }

    fn u8(&mut self) -> io::Result<u8> {
        self.cursor.read_u8()
    }

    fn bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.cursor.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn skip(&mut self, len: u64) {
        let pos = self.cursor.position();
        self.cursor.set_position(pos + len);
    }
}

/// A font property value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Int(i32),
    Str(String),
}

/// Per-glyph metrics as stored in the metrics table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PcfMetric {
    pub left_bearing: i16,
    pub right_bearing: i16,
    pub advance: i16,
    pub ascent: i16,
    pub descent: i16,
}

impl PcfMetric {
    pub fn width(&self) -> u32 {
        (self.right_bearing as i32 - self.left_bearing as i32).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.ascent as i32 + self.descent as i32).max(0) as u32
    }
}

/// One encoded glyph of a PCF font with its bitmap normalised to MSB-first rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcfGlyph {
    pub code: u32,
    pub metric: PcfMetric,
    pub bitmap: PackedBitmap,
}

/// A parsed PCF font
#[derive(Debug, Clone, Default)]
pub struct PcfFont {
    pub properties: Vec<(String, PropertyValue)>,
    pub glyphs: Vec<PcfGlyph>,
    pub font_ascent: Option<i32>,
    pub font_descent: Option<i32>,
}

impl PcfFont {
    /// Parses a PCF file
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 8 || data[..4] != PCF_MAGIC {
            return Err(Error::InvalidFontData("not a PCF file".into()));
        }
        let toc = read_toc(data).map_err(|e| table_error("table of contents", e))?;
        let find = |kind: u32| toc.iter().find(|t| t.kind == kind);

        let properties = match find(PCF_PROPERTIES) {
            Some(entry) => read_properties(data, entry).map_err(|e| table_error("properties", e))?,
            None => Vec::new(),
        };

        let accel = find(PCF_BDF_ACCELERATORS).or_else(|| find(PCF_ACCELERATORS));
        let (mut font_ascent, mut font_descent) = match accel {
            Some(entry) => {
                let (a, d) =
                    read_accelerators(data, entry).map_err(|e| table_error("accelerators", e))?;
                (Some(a), Some(d))
            }
            None => (None, None),
        };
        for (name, value) in &properties {
            match (name.as_str(), value) {
                ("FONT_ASCENT", PropertyValue::Int(v)) if font_ascent.is_none() => {
                    font_ascent = Some(*v)
                }
                ("FONT_DESCENT", PropertyValue::Int(v)) if font_descent.is_none() => {
                    font_descent = Some(*v)
                }
                _ => {}
            }
        }

        let missing = |table: &str| Error::InvalidFontData(format!("PCF has no {table} table"));
        let metrics_entry = find(PCF_METRICS).ok_or_else(|| missing("metrics"))?;
        let metrics = read_metrics(data, metrics_entry).map_err(|e| table_error("metrics", e))?;

        let bitmaps_entry = find(PCF_BITMAPS).ok_or_else(|| missing("bitmaps"))?;
        let bitmaps =
            read_bitmaps(data, bitmaps_entry, &metrics).map_err(|e| table_error("bitmaps", e))?;

        let encodings_entry = find(PCF_BDF_ENCODINGS).ok_or_else(|| missing("encodings"))?;
        let encodings =
            read_encodings(data, encodings_entry).map_err(|e| table_error("encodings", e))?;

        let mut glyphs = Vec::with_capacity(encodings.len());
        for (code, index) in encodings {
            match (metrics.get(index), bitmaps.get(index)) {
                (Some(metric), Some(bitmap)) => glyphs.push(PcfGlyph {
                    code,
                    metric: *metric,
                    bitmap: bitmap.clone(),
                }),
                _ => log::warn!("PCF encoding {code} points at missing glyph {index}"),
            }
        }

        log::debug!("Parsed PCF font: {} glyphs, {} properties", glyphs.len(), properties.len());
        Ok(Self {
            properties,
            glyphs,
            font_ascent,
            font_descent,
        })
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    fn int_property(&self, name: &str) -> Option<i32> {
        match self.property(name) {
            Some(PropertyValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// The XLFD name, if the font carries one
    pub fn name(&self) -> Option<&str> {
        match self.property("FONT") {
            Some(PropertyValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Re-serializes the font as BDF text
    pub fn to_bdf(&self) -> String {
        let min_x = self.glyphs.iter().map(|g| g.metric.left_bearing as i32).min().unwrap_or(0);
        let max_x = self.glyphs.iter().map(|g| g.metric.right_bearing as i32).max().unwrap_or(0);
        let max_ascent = self.glyphs.iter().map(|g| g.metric.ascent as i32).max().unwrap_or(0);
        let max_descent = self.glyphs.iter().map(|g| g.metric.descent as i32).max().unwrap_or(0);
        let ascent = self.font_ascent.unwrap_or(max_ascent);
        let descent = self.font_descent.unwrap_or(max_descent);
        let size = self
            .int_property("PIXEL_SIZE")
            .or_else(|| self.int_property("POINT_SIZE").map(|p| p / 10))
            .unwrap_or(ascent + descent);

        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(out, "STARTFONT 2.1");
        let _ = writeln!(out, "FONT {}", self.name().unwrap_or("pcf-font"));
        let _ = writeln!(out, "SIZE {size} 75 75");
        let _ = writeln!(
            out,
            "FONTBOUNDINGBOX {} {} {} {}",
            max_x - min_x,
            max_ascent + max_descent,
            min_x,
            -max_descent
        );
        let _ = writeln!(out, "STARTPROPERTIES 2");
        let _ = writeln!(out, "FONT_ASCENT {ascent}");
        let _ = writeln!(out, "FONT_DESCENT {descent}");
        let _ = writeln!(out, "ENDPROPERTIES");
        let _ = writeln!(out, "CHARS {}", self.glyphs.len());

        for glyph in &self.glyphs {
            let m = &glyph.metric;
            let _ = writeln!(out, "STARTCHAR char{}", glyph.code);
            let _ = writeln!(out, "ENCODING {}", glyph.code);
            let _ = writeln!(out, "DWIDTH {} 0", m.advance);
            let (width, height) = (m.width(), m.height());
            let _ = writeln!(out, "BBX {width} {height} {} {}", m.left_bearing, -m.descent);
            let _ = writeln!(out, "BITMAP");
            for y in 0..glyph.bitmap.height() {
                for byte in glyph.bitmap.row(y) {
                    let _ = write!(out, "{byte:02X}");
                }
                out.push('\n');
            }
            let _ = writeln!(out, "ENDCHAR");
        }
        let _ = writeln!(out, "ENDFONT");
        out
    }
}

/// Imports a PCF font by way of its BDF text form
pub fn import_pcf(data: &[u8]) -> Result<FontAsset> {
    let pcf = PcfFont::parse(data)?;
    Ok(parse_bdf(&pcf.to_bdf()))
}

fn table_error(table: &str, e: io::Error) -> Error {
    Error::InvalidFontData(format!("PCF {table} table: {e}"))
}

fn read_toc(data: &[u8]) -> io::Result<Vec<TocEntry>> {
    let mut cursor = Cursor::new(&data[4..]);
    let count = cursor.read_u32::<LittleEndian>()?;
    // Each entry is 16 bytes; refuse counts the file cannot hold
    if count as usize > data.len() / 16 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, format!("{count} tables declared")));
    }
    let mut toc = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let kind = cursor.read_u32::<LittleEndian>()?;
        let _format = cursor.read_u32::<LittleEndian>()?;
        let size = cursor.read_u32::<LittleEndian>()?;
        let offset = cursor.read_u32::<LittleEndian>()?;
        toc.push(TocEntry { kind, size, offset });
    }
    Ok(toc)
}

fn c_string(pool: &[u8], offset: i32) -> String {
    let start = (offset.max(0) as usize).min(pool.len());
    let end = pool[start..].iter().position(|&b| b == 0).map_or(pool.len(), |p| start + p);
    String::from_utf8_lossy(&pool[start..end]).into_owned()
}

fn read_properties(data: &[u8], entry: &TocEntry) -> io::Result<Vec<(String, PropertyValue)>> {
    let mut table = TableReader::open(data, entry)?;
    let count = table.i32()?.max(0) as usize;
    let mut raw = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let name_offset = table.i32()?;
        let is_string = table.u8()? != 0;
        let value = table.i32()?;
        raw.push((name_offset, is_string, value));
    }
    if count & 3 != 0 {
        table.skip(4 - (count & 3) as u64);
    }
    let pool_size = table.i32()?.max(0) as usize;
    let pool = table.bytes(pool_size)?;

    Ok(raw
        .into_iter()
        .map(|(name_offset, is_string, value)| {
            let value = if is_string {
                PropertyValue::Str(c_string(&pool, value))
            } else {
                PropertyValue::Int(value)
            };
            (c_string(&pool, name_offset), value)
        })
        .collect())
}

fn read_accelerators(data: &[u8], entry: &TocEntry) -> io::Result<(i32, i32)> {
    let mut table = TableReader::open(data, entry)?;
    // noOverlap, constantMetrics, terminalFont, constantWidth, inkInside,
    // inkMetrics, drawDirection, padding
    table.skip(8);
    let ascent = table.i32()?;
    let descent = table.i32()?;
    Ok((ascent, descent))
}

fn read_metrics(data: &[u8], entry: &TocEntry) -> io::Result<Vec<PcfMetric>> {
    let mut table = TableReader::open(data, entry)?;
    if table.format.is(PCF_COMPRESSED_METRICS) {
        let count = table.i16()?.max(0) as usize;
        let mut metrics = Vec::with_capacity(count);
        for _ in 0..count {
            let mut field = || -> io::Result<i16> { Ok(table.u8()? as i16 - 0x80) };
            metrics.push(PcfMetric {
                left_bearing: field()?,
                right_bearing: field()?,
                advance: field()?,
                ascent: field()?,
                descent: field()?,
            });
        }
        Ok(metrics)
    } else {
        let count = table.i32()?.max(0) as usize;
        let mut metrics = Vec::with_capacity(count.min(65536));
        for _ in 0..count {
            let metric = PcfMetric {
                left_bearing: table.i16()?,
                right_bearing: table.i16()?,
                advance: table.i16()?,
                ascent: table.i16()?,
                descent: table.i16()?,
            };
            let _attributes = table.u16()?;
            metrics.push(metric);
        }
        Ok(metrics)
    }
}

fn read_bitmaps(
    data: &[u8],
    entry: &TocEntry,
    metrics: &[PcfMetric],
) -> io::Result<Vec<PackedBitmap>> {
    let mut table = TableReader::open(data, entry)?;
    let format = table.format;
    let count = table.i32()?.max(0) as usize;
    if count != metrics.len() {
        log::warn!("PCF has {count} bitmaps for {} metrics", metrics.len());
    }
    let mut offsets = Vec::with_capacity(count.min(65536));
    for _ in 0..count {
        offsets.push(table.i32()?.max(0) as usize);
    }
    let mut sizes = [0usize; 4];
    for size in &mut sizes {
        *size = table.i32()?.max(0) as usize;
    }
    let mut bits = table.bytes(sizes[format.pad_index()])?;
    normalize_bit_order(&mut bits, format);

    let pad = format.glyph_pad();
    let mut bitmaps = Vec::with_capacity(count);
    for (offset, metric) in offsets.iter().zip(metrics) {
        let (width, height) = (metric.width(), metric.height());
        let stride = PackedBitmap::row_stride_for(width);
        let padded = stride.div_ceil(pad) * pad;
        let mut bitmap = PackedBitmap::new(width, height);
        for y in 0..height {
            let row_start = offset + y as usize * padded;
            let Some(row) = bits.get(row_start..row_start + stride) else {
                log::warn!("PCF glyph bitmap at offset {offset} is truncated");
                break;
            };
            for x in 0..width {
                let byte = row[x as usize / 8];
                bitmap.set(x, y, byte & (0x80 >> (x % 8)) != 0);
            }
        }
        bitmaps.push(bitmap);
    }
    Ok(bitmaps)
}

/// Rewrites bitmap data so that every byte is MSB-first in reading order
fn normalize_bit_order(bits: &mut [u8], format: TableFormat) {
    if !format.msb_bit_first() {
        for byte in bits.iter_mut() {
            *byte = byte.reverse_bits();
        }
    }
    let unit = format.scan_unit();
    if format.big_endian() != format.msb_bit_first() && unit > 1 {
        for chunk in bits.chunks_exact_mut(unit) {
            chunk.reverse();
        }
    }
}

fn read_encodings(data: &[u8], entry: &TocEntry) -> io::Result<Vec<(u32, usize)>> {
    let mut table = TableReader::open(data, entry)?;
    let min_byte2 = table.i16()? as i32;
    let max_byte2 = table.i16()? as i32;
    let min_byte1 = table.i16()? as i32;
    let max_byte1 = table.i16()? as i32;
    let _default_char = table.i16()?;

    let mut encodings = Vec::new();
    for byte1 in min_byte1..=max_byte1 {
        for byte2 in min_byte2..=max_byte2 {
            let index = table.u16()?;
            if index != NO_GLYPH {
                encodings.push((((byte1 << 8) | byte2) as u32, index as usize));
            }
        }
    }
    Ok(encodings)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Glyph fixtures: code, MSB-first rows, width, ascent, descent, advance
    const GLYPHS: [(u32, &[u8], i16, i16, i16, i16); 3] = [
        (65, &[0x20, 0x50, 0xF8], 5, 3, 0, 6),
        (103, &[0xE0, 0xA0, 0xE0, 0x20], 3, 3, 1, 4),
        (32, &[], 0, 0, 0, 4),
    ];

    struct Writer {
        big_endian: bool,
        buf: Vec<u8>,
    }

    impl Writer {
        fn new(format: u32) -> Self {
            let mut buf = Vec::new();
            buf.extend_from_slice(&format.to_le_bytes());
            Self {
                big_endian: format & PCF_BYTE_MASK != 0,
                buf,
            }
        }

        fn i32(&mut self, v: i32) {
            let bytes = if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
            self.buf.extend_from_slice(&bytes);
        }

        fn i16(&mut self, v: i16) {
            let bytes = if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
            self.buf.extend_from_slice(&bytes);
        }
    }

    fn metrics_table(format: u32) -> Vec<u8> {
        let mut w = Writer::new(format);
        if format & PCF_FORMAT_MASK == PCF_COMPRESSED_METRICS {
            w.i16(GLYPHS.len() as i16);
            for (_, _, width, ascent, descent, advance) in GLYPHS {
                for v in [0, width, advance, ascent, descent] {
                    w.buf.push((v + 0x80) as u8);
                }
            }
        } else {
            w.i32(GLYPHS.len() as i32);
            for (_, _, width, ascent, descent, advance) in GLYPHS {
                for v in [0, width, advance, ascent, descent, 0] {
                    w.i16(v);
                }
            }
        }
        w.buf
    }

    /// Stores rows with the given padding, bit order and scan-unit swapping
    fn bitmaps_table(format: u32) -> Vec<u8> {
        let fmt = TableFormat(format);
        let pad = fmt.glyph_pad();
        let mut data = Vec::new();
        let mut offsets = Vec::new();
        for (_, rows, width, ..) in GLYPHS {
            offsets.push(data.len() as i32);
            let stride = (width as usize).div_ceil(8);
            for &row in rows {
                let mut padded = vec![0u8; stride.div_ceil(pad) * pad];
                padded[0] = if fmt.msb_bit_first() { row } else { row.reverse_bits() };
                if fmt.big_endian() != fmt.msb_bit_first() {
                    for unit in padded.chunks_exact_mut(fmt.scan_unit()) {
                        unit.reverse();
                    }
                }
                data.extend_from_slice(&padded);
            }
        }
        let mut w = Writer::new(format);
        w.i32(GLYPHS.len() as i32);
        for offset in offsets {
            w.i32(offset);
        }
        for i in 0..4 {
            w.i32(if i == fmt.pad_index() { data.len() as i32 } else { 0 });
        }
        w.buf.extend_from_slice(&data);
        w.buf
    }

    fn encodings_table(format: u32) -> Vec<u8> {
        let mut w = Writer::new(format);
        for v in [32, 103, 0, 0, 0] {
            w.i16(v);
        }
        for code in 32..=103 {
            let index = GLYPHS.iter().position(|g| g.0 == code).map_or(-1, |i| i as i16);
            w.i16(index);
        }
        w.buf
    }

    fn properties_table(format: u32) -> Vec<u8> {
        let pool = b"FONT\0tiny-pcf\0POINT_SIZE\0";
        let mut w = Writer::new(format);
        w.i32(2);
        w.i32(0);
        w.buf.push(1);
        w.i32(5);
        w.i32(14);
        w.buf.push(0);
        w.i32(80);
        w.buf.extend_from_slice(&[0, 0]);
        w.i32(pool.len() as i32);
        w.buf.extend_from_slice(pool);
        w.buf
    }

    fn accelerators_table(format: u32) -> Vec<u8> {
        let mut w = Writer::new(format);
        w.buf.extend_from_slice(&[0; 8]);
        w.i32(3);
        w.i32(1);
        w.buf
    }

    fn assemble(tables: Vec<(u32, Vec<u8>)>) -> Vec<u8> {
        let mut out = PCF_MAGIC.to_vec();
        out.extend_from_slice(&(tables.len() as u32).to_le_bytes());
        let mut offset = 8 + 16 * tables.len();
        for (kind, body) in &tables {
            let format = u32::from_le_bytes([body[0], body[1], body[2], body[3]]);
            for v in [*kind, format, body.len() as u32, offset as u32] {
                out.extend_from_slice(&v.to_le_bytes());
            }
            offset += body.len();
        }
        for (_, body) in tables {
            out.extend_from_slice(&body);
        }
        out
    }

    fn build(format: u32, metrics_format: u32) -> Vec<u8> {
        assemble(vec![
            (PCF_PROPERTIES, properties_table(format)),
            (PCF_ACCELERATORS, accelerators_table(format)),
            (PCF_METRICS, metrics_table(metrics_format)),
            (PCF_BITMAPS, bitmaps_table(format)),
            (PCF_BDF_ENCODINGS, encodings_table(format)),
        ])
    }

    fn assert_glyphs(font: &PcfFont) {
        assert_eq!(font.glyphs.len(), 3);
        let codes: Vec<u32> = font.glyphs.iter().map(|g| g.code).collect();
        assert_eq!(codes, vec![32, 65, 103]);
        let a = font.glyphs.iter().find(|g| g.code == 65).unwrap();
        assert_eq!(a.bitmap.as_bytes(), &[0x20, 0x50, 0xF8]);
        let g = font.glyphs.iter().find(|g| g.code == 103).unwrap();
        assert_eq!(g.bitmap.as_bytes(), &[0xE0, 0xA0, 0xE0, 0x20]);
        assert_eq!(g.metric.descent, 1);
    }

    #[test]
    fn test_msb_compressed_metrics() {
        let msb = PCF_BYTE_MASK | PCF_BIT_MASK;
        let font = PcfFont::parse(&build(msb, msb | PCF_COMPRESSED_METRICS)).unwrap();
        assert_glyphs(&font);
        assert_eq!(font.name(), Some("tiny-pcf"));
        assert_eq!(font.property("POINT_SIZE"), Some(&PropertyValue::Int(80)));
        assert_eq!((font.font_ascent, font.font_descent), (Some(3), Some(1)));
    }

    #[test]
    fn test_lsb_padded_rows() {
        // Little-endian integers, LSB bit order, rows padded to 4 bytes
        let font = PcfFont::parse(&build(2, 0)).unwrap();
        assert_glyphs(&font);
    }

    #[test]
    fn test_byte_swapped_scan_units() {
        // Big-endian integers with LSB bit order and 2 byte scan units
        let format = PCF_BYTE_MASK | (1 << 4) | 2;
        let font = PcfFont::parse(&build(format, PCF_BYTE_MASK)).unwrap();
        assert_glyphs(&font);
    }

    #[test]
    fn test_bdf_text_and_import_chain() {
        let msb = PCF_BYTE_MASK | PCF_BIT_MASK;
        let data = build(msb, msb);
        let bdf = PcfFont::parse(&data).unwrap().to_bdf();
        assert!(bdf.starts_with("STARTFONT 2.1\nFONT tiny-pcf\nSIZE 8 75 75\n"));
        assert!(bdf.contains("FONTBOUNDINGBOX 5 4 0 -1\n"));
        assert!(bdf.contains(
            "STARTCHAR char65\nENCODING 65\nDWIDTH 6 0\nBBX 5 3 0 0\nBITMAP\n20\n50\nF8\nENDCHAR\n"
        ));

        let font = import_pcf(&data).unwrap();
        assert_eq!(font.name, "tiny-pcf");
        assert_eq!(font.len(), 3);
        assert_eq!(font.glyph(65).unwrap().bitmap.as_bytes(), &[0x20, 0x50, 0xF8]);
        assert_eq!(font.glyph(103).unwrap().y_offset, -1);
        assert_eq!(font.glyph(32).unwrap().bitmap.width(), 0);
        assert_eq!((font.properties.ascent, font.properties.descent), (3, 1));
    }

    #[test]
    fn test_rejects_non_pcf() {
        assert!(matches!(PcfFont::parse(b"STARTFONT 2.1"), Err(Error::InvalidFontData(_))));
        let mut data = build(PCF_BYTE_MASK | PCF_BIT_MASK, 0);
        data.truncate(200);
        assert!(matches!(PcfFont::parse(&data), Err(Error::InvalidFontData(_))));
    }
}
