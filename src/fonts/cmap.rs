//! ToUnicode CMap parser.
//!
//! ToUnicode streams map character codes to Unicode and are the reliable
//! path for text extraction when fonts use custom encodings. Mappings
//! come in two forms: `bfchar` (single code) and `bfrange` (a contiguous
//! run mapped onto consecutive code points). Ranges are kept as ranges
//! rather than expanded, so a `<0000> <FFFF>` run costs one entry.

use crate::error::Result;
use regex::Regex;
use std::collections::HashMap;

/// A parsed ToUnicode CMap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToUnicodeCMap {
    /// Single-code mappings from bfchar sections (and array-form bfranges)
    pub char_map: HashMap<u32, char>,
    /// Contiguous run mappings from bfrange sections
    pub ranges: Vec<CMapRange>,
}

/// A bfrange run: codes `start..=end` map to consecutive code points
/// beginning at `start_unicode`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CMapRange {
    /// First character code in the run
    pub start: u32,
    /// Last character code in the run (inclusive)
    pub end: u32,
    /// Unicode scalar the run starts at
    pub start_unicode: char,
}

impl ToUnicodeCMap {
    /// Look up a character code.
    ///
    /// Explicit bfchar mappings win over ranges; among ranges the first
    /// match in stream order wins.
    pub fn lookup(&self, cid: u32) -> Option<char> {
        if let Some(&ch) = self.char_map.get(&cid) {
            return Some(ch);
        }

        for range in &self.ranges {
            if cid >= range.start && cid <= range.end {
                let offset = cid - range.start;
                return char::from_u32(range.start_unicode as u32 + offset);
            }
        }

        None
    }

    /// Check whether the map has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.char_map.is_empty() && self.ranges.is_empty()
    }
}

/// Parse a decoded ToUnicode CMap stream.
///
/// All bfchar and bfrange sections in the stream accumulate into one
/// map. Lines that fail to parse are skipped.
pub fn parse_tounicode_cmap(data: &[u8]) -> Result<ToUnicodeCMap> {
    let content = String::from_utf8_lossy(data);
    let mut cmap = ToUnicodeCMap::default();

    for section in extract_sections(&content, "beginbfchar", "endbfchar") {
        for line in section.lines() {
            if let Some((src, dst)) = parse_bfchar_line(line) {
                log::trace!("ToUnicode bfchar: 0x{:04X} -> {:?}", src, dst);
                cmap.char_map.insert(src, dst);
            }
        }
    }

    for section in extract_sections(&content, "beginbfrange", "endbfrange") {
        for line in section.lines() {
            parse_bfrange_line(line, &mut cmap);
        }
    }

    Ok(cmap)
}

/// Extract the text between each begin/end marker pair.
fn extract_sections<'a>(content: &'a str, begin: &str, end: &str) -> Vec<&'a str> {
    let mut sections = Vec::new();
    let mut remaining = content;

    while let Some(begin_pos) = remaining.find(begin) {
        let after_begin = &remaining[begin_pos + begin.len()..];
        if let Some(end_pos) = after_begin.find(end) {
            sections.push(&after_begin[..end_pos]);
            remaining = &after_begin[end_pos + end.len()..];
        } else {
            break;
        }
    }

    sections
}

/// Parse a bfchar line: `<src> <dst>`.
fn parse_bfchar_line(line: &str) -> Option<(u32, char)> {
    lazy_static::lazy_static! {
        static ref RE: Regex = Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>").unwrap();
    }

    let caps = RE.captures(line)?;
    let src = u32::from_str_radix(&caps[1], 16).ok()?;
    let dst = parse_unicode_scalar(&caps[2])?;
    Some((src, dst))
}

/// Parse a bfrange line in either form.
///
/// `<start> <end> <dst>` becomes a [`CMapRange`]; the array form
/// `<start> <end> [<dst1> <dst2> ...]` expands into explicit char_map
/// entries since its destinations are not consecutive.
fn parse_bfrange_line(line: &str, cmap: &mut ToUnicodeCMap) {
    lazy_static::lazy_static! {
        static ref RE_ARRAY: Regex = Regex::new(
            r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*\[((?:\s*<[0-9A-Fa-f]+>\s*)+)\]"
        ).unwrap();
        static ref RE_SEQ: Regex = Regex::new(
            r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>"
        ).unwrap();
        static ref RE_HEX: Regex = Regex::new(r"<([0-9A-Fa-f]+)>").unwrap();
    }

    if let Some(caps) = RE_ARRAY.captures(line) {
        let (Ok(start), Ok(end)) = (
            u32::from_str_radix(&caps[1], 16),
            u32::from_str_radix(&caps[2], 16),
        ) else {
            return;
        };

        for (i, hex) in RE_HEX.captures_iter(&caps[3]).enumerate() {
            let src = start + i as u32;
            if src > end {
                break;
            }
            if let Some(ch) = parse_unicode_scalar(hex.get(1).unwrap().as_str()) {
                cmap.char_map.insert(src, ch);
            }
        }
        return;
    }

    if let Some(caps) = RE_SEQ.captures(line) {
        let (Ok(start), Ok(end)) = (
            u32::from_str_radix(&caps[1], 16),
            u32::from_str_radix(&caps[2], 16),
        ) else {
            return;
        };
        if end < start {
            return;
        }
        if let Some(start_unicode) = parse_unicode_scalar(&caps[3]) {
            cmap.ranges.push(CMapRange {
                start,
                end,
                start_unicode,
            });
        }
    }
}

/// Decode a destination hex string to a single Unicode scalar.
///
/// Eight hex digits may be a UTF-16 surrogate pair for a code point
/// above the BMP; otherwise the first four digits are taken as the
/// code point.
fn parse_unicode_scalar(hex: &str) -> Option<char> {
    if hex.len() == 8 {
        let value = u32::from_str_radix(hex, 16).ok()?;
        let high = (value >> 16) as u16;
        let low = (value & 0xFFFF) as u16;
        if (0xD800..=0xDBFF).contains(&high) && (0xDC00..=0xDFFF).contains(&low) {
            let codepoint = 0x10000 + (((high & 0x3FF) as u32) << 10) + ((low & 0x3FF) as u32);
            return char::from_u32(codepoint);
        }
    }

    let take = hex.len().min(4);
    let code = u32::from_str_radix(&hex[..take], 16).ok()?;
    char::from_u32(code)
}
