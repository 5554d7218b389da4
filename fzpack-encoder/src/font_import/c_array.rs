//! Glyph tables embedded as C string literals
//!
//! Fonts shipped as C sources carry their bytes in a string literal tagged
//! with `U8G2_FONT_SECTION(...)`. Two layouts occur in the wild:
//!
//! ```c
//! U8G2_FONT_SECTION("\u0000\u0008...")
//! const uint8_t font[] U8G2_FONT_SECTION("font") = "\000\010" "\002...";
//! ```
//!
//! When the tagged declaration is followed by `=`, the assigned literal is the
//! font data and the parenthesised one is only its name.

use crate::{Error, Result};
use fzpack_core::FontAsset;
use std::iter::Peekable;
use std::str::Chars;

/// Token that introduces the embedded font data
pub const FONT_SECTION_MARKER: &str = "U8G2_FONT_SECTION(";

/// Extracts the raw glyph-table bytes from C source text
pub fn extract_font_section(source: &str) -> Result<Vec<u8>> {
    let start = source
        .find(FONT_SECTION_MARKER)
        .ok_or(fzpack_core::Error::MarkerNotFound("U8G2_FONT_SECTION"))?;

    let mut chars = source[start + FONT_SECTION_MARKER.len()..].chars().peekable();
    let tagged = read_literals(&mut chars)?;

    skip_blank(&mut chars);
    if chars.next_if_eq(&')').is_none() {
        return Err(Error::InvalidFontData("expected ')' after font section literal".into()));
    }
    skip_blank(&mut chars);
    if chars.next_if_eq(&'=').is_some() {
        log::debug!("Font section is a name tag, reading the assigned literal");
        return read_literals(&mut chars);
    }
    Ok(tagged)
}

/// Reads the glyph table embedded in C source text
pub fn import_c_array(source: &str) -> Result<FontAsset> {
    let bytes = extract_font_section(source)?;
    Ok(FontAsset::decode(&bytes)?)
}

fn skip_blank(chars: &mut Peekable<Chars<'_>>) {
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let mut ahead = chars.clone();
        match (ahead.next(), ahead.next()) {
            (Some('/'), Some('*')) => {
                let mut prev = '\0';
                for c in ahead.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                *chars = ahead;
            }
            (Some('/'), Some('/')) => {
                for c in ahead.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
                *chars = ahead;
            }
            _ => return,
        }
    }
}

/// Reads one or more adjacent string literals and concatenates their bytes
fn read_literals(chars: &mut Peekable<Chars<'_>>) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut count = 0;
    loop {
        skip_blank(chars);
        if chars.next_if_eq(&'"').is_none() {
            break;
        }
        read_literal_body(chars, &mut out)?;
        count += 1;
    }
    if count == 0 {
        return Err(Error::InvalidFontData("expected a string literal".into()));
    }
    Ok(out)
}

fn read_literal_body(chars: &mut Peekable<Chars<'_>>, out: &mut Vec<u8>) -> Result<()> {
    while let Some(c) = chars.next() {
        match c {
            '"' => return Ok(()),
            '\\' => read_escape(chars, out)?,
            c => push_char(out, c as u32),
        }
    }
    Err(Error::InvalidFontData("unterminated string literal".into()))
}

fn read_escape(chars: &mut Peekable<Chars<'_>>, out: &mut Vec<u8>) -> Result<()> {
    let Some(c) = chars.next() else {
        return Err(Error::InvalidFontData("dangling escape at end of input".into()));
    };
    match c {
        'u' => {
            let digits: String =
                (0..4).filter_map(|_| chars.next_if(|c| c.is_ascii_hexdigit())).collect();
            if digits.len() != 4 {
                return Err(Error::InvalidFontData(format!("bad \\u escape '\\u{digits}'")));
            }
            let value = u32::from_str_radix(&digits, 16)
                .map_err(|e| Error::InvalidFontData(e.to_string()))?;
            push_char(out, value);
        }
        'x' => {
            let digits: String =
                (0..2).filter_map(|_| chars.next_if(|c| c.is_ascii_hexdigit())).collect();
            let value = u8::from_str_radix(&digits, 16)
                .map_err(|_| Error::InvalidFontData("bad \\x escape".into()))?;
            out.push(value);
        }
        '0'..='7' => {
            let mut value = c.to_digit(8).unwrap_or(0);
            for _ in 0..2 {
                match chars.next_if(|c| c.is_digit(8)) {
                    Some(d) => value = value * 8 + d.to_digit(8).unwrap_or(0),
                    None => break,
                }
            }
            out.push((value & 0xFF) as u8);
        }
        'n' => out.push(b'\n'),
        't' => out.push(b'\t'),
        'r' => out.push(b'\r'),
        'a' => out.push(0x07),
        'b' => out.push(0x08),
        'f' => out.push(0x0C),
        'v' => out.push(0x0B),
        other => push_char(out, other as u32),
    }
    Ok(())
}

/// Code points up to 0xFF are stored as a single byte; anything above as UTF-8
fn push_char(out: &mut Vec<u8>, value: u32) {
    if value <= 0xFF {
        out.push(value as u8);
    } else if let Some(c) = char::from_u32(value) {
        let mut buf = [0u8; 4];
        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fzpack_core::{GlyphRecord, PackedBitmap};

    fn escape_u(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("\\u{:04x}", b)).collect()
    }

    fn escape_octal(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("\\{:o}", b)).collect()
    }

    fn sample_table() -> Vec<u8> {
        let mut font = FontAsset::new("tiny");
        font.properties.bounding_box.width = 8;
        font.properties.bounding_box.height = 2;
        let bitmap = PackedBitmap::from_bytes(8, 2, vec![0xA5, 0xFF]).unwrap();
        font.insert_glyph(GlyphRecord::new(65, 0, 0, bitmap));
        font.encode().unwrap()
    }

    #[test]
    fn test_unicode_escapes() {
        let table = sample_table();
        let source = format!("U8G2_FONT_SECTION(\"{}\")", escape_u(&table));
        assert_eq!(extract_font_section(&source).unwrap(), table);

        let font = import_c_array(&source).unwrap();
        assert_eq!(font.glyph(65).unwrap().bitmap.as_bytes(), &[0xA5, 0xFF]);
    }

    #[test]
    fn test_assigned_literals_are_concatenated() {
        let table = sample_table();
        let (head, tail) = table.split_at(10);
        let source = format!(
            concat!(
                "const uint8_t tiny[{}] U8G2_FONT_SECTION(\"tiny\") =\n",
                "  \"{}\" /* split */\n  \"{}\";\n"
            ),
            table.len(),
            escape_octal(head),
            escape_octal(tail)
        );
        assert_eq!(extract_font_section(&source).unwrap(), table);
    }

    #[test]
    fn test_mixed_escapes() {
        let source = r#"U8G2_FONT_SECTION("A\x41\101\n\\\"ÿĀ")"#;
        let bytes = extract_font_section(source).unwrap();
        assert_eq!(bytes, vec![b'A', 0x41, 0x41, b'\n', b'\\', b'"', 0xFF, 0xC4, 0x80]);
    }

    #[test]
    fn test_marker_missing() {
        assert!(matches!(
            extract_font_section("const char *x = \"abc\";"),
            Err(Error::Core(fzpack_core::Error::MarkerNotFound(_)))
        ));
    }

    #[test]
    fn test_unterminated_literal() {
        assert!(matches!(
            extract_font_section("U8G2_FONT_SECTION(\"abc"),
            Err(Error::InvalidFontData(_))
        ));
    }
}
