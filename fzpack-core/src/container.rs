//! BMX / BM container serialization and the 16 byte meta record

use crate::{Error, PackedBitmap, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};

/// Largest icon width the display accepts
pub const MAX_WIDTH: u32 = 128;

/// Largest icon height the display accepts
pub const MAX_HEIGHT: u32 = 64;

/// Width, height and compression flag
const BMX_HEADER_SIZE: usize = 9;

/// A BMX buffer needs its header and at least one payload byte
const BMX_MIN_SIZE: usize = BMX_HEADER_SIZE + 1;

/// Size of an encoded meta record
const META_SIZE: usize = 16;

/// Payload compression flag shared by BMX and BM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Compression {
    #[default]
    None,
    Compressed,
}

impl Compression {
    pub fn flag(self) -> u8 {
        match self {
            Compression::None => 0x00,
            Compression::Compressed => 0x01,
        }
    }

    pub fn from_flag(flag: u8) -> Result<Self> {
        match flag {
            0x00 => Ok(Compression::None),
            0x01 => Ok(Compression::Compressed),
            other => Err(Error::UnsupportedEncoding(format!(
                "unknown compression flag 0x{other:02X}"
            ))),
        }
    }

    fn require_uncompressed(self) -> Result<()> {
        match self {
            Compression::None => Ok(()),
            Compression::Compressed => Err(Error::UnsupportedEncoding(
                "compressed bitmaps are not supported".into(),
            )),
        }
    }
}

/// BMX file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmxHeader {
    /// Icon width in pixels
    pub width: i32,
    /// Icon height in pixels
    pub height: i32,
    /// Payload compression
    pub compression: Compression,
}

impl BmxHeader {
    /// Reads a header from a reader
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let width = reader.read_i32::<LittleEndian>()?;
        let height = reader.read_i32::<LittleEndian>()?;
        let flag = reader.read_u8()?;

        if width <= 0 || width > MAX_WIDTH as i32 || height <= 0 || height > MAX_HEIGHT as i32 {
            return Err(Error::dimensions(width, height));
        }
        let compression = Compression::from_flag(flag)?;

        Ok(Self {
            width,
            height,
            compression,
        })
    }

    /// Writes the header to a writer
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_i32::<LittleEndian>(self.width)?;
        writer.write_i32::<LittleEndian>(self.height)?;
        writer.write_u8(self.compression.flag())?;
        Ok(())
    }

    /// Packed payload length implied by the header
    pub fn payload_len(&self) -> usize {
        PackedBitmap::byte_len_for(self.width as u32, self.height as u32)
    }
}

/// Result of decoding a BMX buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBmx {
    pub width: u32,
    pub height: u32,
    pub bitmap: PackedBitmap,
}

fn check_display_size(bitmap: &PackedBitmap) -> Result<()> {
    let (w, h) = (bitmap.width(), bitmap.height());
    if w == 0 || w > MAX_WIDTH || h == 0 || h > MAX_HEIGHT {
        return Err(Error::dimensions(w, h));
    }
    Ok(())
}

/// Encodes a bitmap as an uncompressed BMX container
pub fn encode_bmx(bitmap: &PackedBitmap) -> Result<Vec<u8>> {
    encode_bmx_with(bitmap, Compression::None)
}

/// Encodes a bitmap as a BMX container with the requested compression
pub fn encode_bmx_with(bitmap: &PackedBitmap, compression: Compression) -> Result<Vec<u8>> {
    check_display_size(bitmap)?;
    compression.require_uncompressed()?;

    let header = BmxHeader {
        width: bitmap.width() as i32,
        height: bitmap.height() as i32,
        compression,
    };
    let mut buffer = Vec::with_capacity(BMX_HEADER_SIZE + bitmap.as_bytes().len());
    header.write(&mut buffer)?;
    buffer.write_all(bitmap.as_bytes())?;
    Ok(buffer)
}

/// Checks a BMX buffer without copying its payload and returns its header
pub fn validate_bmx(bytes: &[u8]) -> Result<BmxHeader> {
    if bytes.len() < BMX_MIN_SIZE {
        return Err(Error::TruncatedData {
            needed: BMX_MIN_SIZE,
            actual: bytes.len(),
        });
    }

    let header = BmxHeader::read(&mut Cursor::new(bytes))?;
    header.compression.require_uncompressed()?;

    let expected = header.payload_len();
    let actual = bytes.len() - BMX_HEADER_SIZE;
    if actual != expected {
        return Err(Error::SizeMismatch { expected, actual });
    }
    Ok(header)
}

/// Decodes a BMX buffer
pub fn decode_bmx(bytes: &[u8]) -> Result<DecodedBmx> {
    let header = validate_bmx(bytes)?;
    let width = header.width as u32;
    let height = header.height as u32;
    let bitmap = PackedBitmap::from_bytes(width, height, bytes[BMX_HEADER_SIZE..].to_vec())?;
    Ok(DecodedBmx { width, height, bitmap })
}

/// Encodes an animation frame: one flag byte followed by the packed bitmap
pub fn encode_bm_frame(bitmap: &PackedBitmap, compression: Compression) -> Result<Vec<u8>> {
    check_display_size(bitmap)?;
    compression.require_uncompressed()?;

    let mut buffer = Vec::with_capacity(1 + bitmap.as_bytes().len());
    buffer.write_u8(compression.flag())?;
    buffer.write_all(bitmap.as_bytes())?;
    Ok(buffer)
}

/// Decodes an animation frame. Frames carry no size, so the caller supplies it.
pub fn decode_bm_frame(bytes: &[u8], width: u32, height: u32) -> Result<PackedBitmap> {
    if width == 0 || width > MAX_WIDTH || height == 0 || height > MAX_HEIGHT {
        return Err(Error::dimensions(width, height));
    }
    let (&flag, payload) = bytes.split_first().ok_or(Error::TruncatedData {
        needed: 1,
        actual: 0,
    })?;
    Compression::from_flag(flag)?.require_uncompressed()?;
    PackedBitmap::from_bytes(width, height, payload.to_vec())
}

/// Fixed 16 byte descriptor: width, height, frame rate and frame count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetaRecord {
    pub width: i32,
    pub height: i32,
    pub frame_rate: i32,
    pub frame_count: i32,
}

impl MetaRecord {
    pub fn new(width: i32, height: i32, frame_rate: i32, frame_count: i32) -> Self {
        Self {
            width,
            height,
            frame_rate,
            frame_count,
        }
    }

    /// Meta record of a still icon
    pub fn for_icon(width: u32, height: u32) -> Self {
        Self::new(width as i32, height as i32, 0, 1)
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let width = reader.read_i32::<LittleEndian>()?;
        let height = reader.read_i32::<LittleEndian>()?;
        let frame_rate = reader.read_i32::<LittleEndian>()?;
        let frame_count = reader.read_i32::<LittleEndian>()?;
        Ok(Self::new(width, height, frame_rate, frame_count))
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_i32::<LittleEndian>(self.width)?;
        writer.write_i32::<LittleEndian>(self.height)?;
        writer.write_i32::<LittleEndian>(self.frame_rate)?;
        writer.write_i32::<LittleEndian>(self.frame_count)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; META_SIZE] {
        let mut out = [0u8; META_SIZE];
        let fields = [self.width, self.height, self.frame_rate, self.frame_count];
        for (chunk, value) in out.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < META_SIZE {
            return Err(Error::TruncatedData {
                needed: META_SIZE,
                actual: bytes.len(),
            });
        }
        if bytes.len() > META_SIZE {
            return Err(Error::SizeMismatch {
                expected: META_SIZE,
                actual: bytes.len(),
            });
        }
        Self::read(&mut Cursor::new(bytes))
    }
}
