//! Byte-string decoding heuristics.
//!
//! PDF strings carry no encoding marker beyond an optional UTF-16 BOM,
//! so strings without a ToUnicode CMap are decoded by an ordered chain
//! of guesses:
//!
//! 1. `FE FF` prefix: UTF-16BE
//! 2. `FF FE` prefix: UTF-16LE
//! 3. valid UTF-8
//! 4. bytes in 0x80..=0x9F present: PDFDocEncoding
//! 5. Latin-1
//!
//! Latin-1 never fails, so the chain always produces a string.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Decode raw string bytes through the heuristic chain.
pub fn decode_bytes(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return decode_utf16::<BigEndian>(&bytes[2..]);
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return decode_utf16::<LittleEndian>(&bytes[2..]);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    if bytes.iter().any(|&b| (0x80..=0x9F).contains(&b)) {
        return decode_pdfdoc(bytes);
    }

    decode_latin1(bytes)
}

/// Decode UTF-16 code units after the BOM. An odd number of payload
/// bytes cannot be UTF-16; the result is empty rather than a panic.
fn decode_utf16<B: ByteOrder>(payload: &[u8]) -> String {
    if payload.len() % 2 != 0 {
        log::debug!("UTF-16 string with odd payload length {}", payload.len());
        return String::new();
    }

    let mut units = vec![0u16; payload.len() / 2];
    B::read_u16_into(payload, &mut units);
    String::from_utf16_lossy(&units)
}

/// Decode PDFDocEncoding (ISO 32000-1 Annex D.3).
///
/// Identical to Latin-1 except for the 0x80..=0x9F block, which holds
/// typographic characters instead of C1 controls.
fn decode_pdfdoc(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| pdfdoc_char(b)).collect()
}

fn pdfdoc_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{2022}', // bullet
        0x81 => '\u{2020}', // dagger
        0x82 => '\u{2021}', // double dagger
        0x83 => '\u{2026}', // ellipsis
        0x84 => '\u{2014}', // em dash
        0x85 => '\u{2013}', // en dash
        0x86 => '\u{0192}', // florin
        0x87 => '\u{2044}', // fraction slash
        0x88 => '\u{2039}', // single left guillemet
        0x89 => '\u{203A}', // single right guillemet
        0x8A => '\u{2212}', // minus
        0x8B => '\u{2030}', // per mille
        0x8C => '\u{201E}', // low double quote
        0x8D => '\u{201C}', // left double quote
        0x8E => '\u{201D}', // right double quote
        0x8F => '\u{2018}', // left single quote
        0x90 => '\u{2019}', // right single quote
        0x91 => '\u{201A}', // low single quote
        0x92 => '\u{2122}', // trademark
        0x93 => '\u{FB01}', // fi ligature
        0x94 => '\u{FB02}', // fl ligature
        0x95 => '\u{0141}', // Lslash
        0x96 => '\u{0152}', // OE
        0x97 => '\u{0160}', // Scaron
        0x98 => '\u{0178}', // Ydieresis
        0x99 => '\u{017D}', // Zcaron
        0x9A => '\u{0131}', // dotless i
        0x9B => '\u{0142}', // lslash
        0x9C => '\u{0153}', // oe
        0x9D => '\u{0161}', // scaron
        0x9E => '\u{017E}', // zcaron
        // 0x9F is undefined in PDFDocEncoding
        0x9F => '\u{FFFD}',
        other => other as char,
    }
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
