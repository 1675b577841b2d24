//! Cross-reference table parser.
//!
//! The xref table maps object numbers to byte offsets in the PDF file,
//! enabling random access to objects. Only classic xref tables are handled:
//! cross-reference streams and incremental-update `/Prev` chains are out of
//! scope, so the table at `startxref` is the whole picture.

use crate::error::{Error, Result};
use crate::object::Object;
use crate::parser::parse_object;
use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

/// Cross-reference table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrefEntry {
    /// Byte offset of the object from the start of the file
    pub offset: u64,
    /// Generation number
    pub generation: u16,
    /// Whether the object is in use (`n`) or free (`f`)
    pub in_use: bool,
}

impl XrefEntry {
    /// Create a new cross-reference entry.
    pub fn new(offset: u64, generation: u16, in_use: bool) -> Self {
        Self {
            offset,
            generation,
            in_use,
        }
    }
}

/// Cross-reference table mapping object numbers to their locations,
/// together with the trailer dictionary that follows it.
#[derive(Debug, Clone, Default)]
pub struct XrefTable {
    entries: HashMap<u32, XrefEntry>,
    trailer: HashMap<String, Object>,
}

impl XrefTable {
    /// Create a new empty cross-reference table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry to the cross-reference table.
    pub fn add_entry(&mut self, object_number: u32, entry: XrefEntry) {
        self.entries.insert(object_number, entry);
    }

    /// Get an entry by object number.
    pub fn get(&self, object_number: u32) -> Option<&XrefEntry> {
        self.entries.get(&object_number)
    }

    /// Check if an object exists in the xref table.
    pub fn contains(&self, object_number: u32) -> bool {
        self.entries.contains_key(&object_number)
    }

    /// The trailer dictionary.
    pub fn trailer(&self) -> &HashMap<String, Object> {
        &self.trailer
    }

    /// Set the trailer dictionary.
    pub fn set_trailer(&mut self, trailer: HashMap<String, Object>) {
        self.trailer = trailer;
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Find the byte offset of the xref table by scanning from the end of the
/// file.
///
/// Searches the last ~1KB for the `startxref` keyword and parses the
/// integer on the following line.
pub fn find_startxref<R: Read + Seek>(reader: &mut R) -> Result<u64> {
    let file_size = reader.seek(SeekFrom::End(0))?;

    let read_size = std::cmp::min(1024, file_size);
    reader.seek(SeekFrom::End(-(read_size as i64)))?;

    let mut buf = Vec::new();
    reader.take(read_size).read_to_end(&mut buf)?;

    let content = String::from_utf8_lossy(&buf);

    let pos = content
        .rfind("startxref")
        .ok_or_else(|| Error::InvalidXref("startxref keyword not found".to_string()))?;

    let after_keyword = &content[pos + "startxref".len()..];

    for line in split_lines(after_keyword.as_bytes()) {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return trimmed.parse::<u64>().map_err(|_| {
                Error::InvalidXref(format!("invalid startxref offset: {:?}", trimmed))
            });
        }
    }

    Err(Error::InvalidXref("no offset after startxref".to_string()))
}

/// Parse the classic cross-reference table and trailer at the given byte
/// offset.
///
/// The format is:
/// ```text
/// xref
/// 0 3                      % subsection: start at object 0, 3 entries
/// 0000000000 65535 f       % 20-byte entry lines
/// 0000000018 00000 n
/// 0000000154 00000 n
/// trailer
/// << /Size 3 /Root 1 0 R >>
/// ```
///
/// Multiple subsections merge into one map. A digit where `xref` is
/// expected means the offset points at a cross-reference stream, which is
/// unsupported here.
pub fn parse_xref<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<XrefTable> {
    reader.seek(SeekFrom::Start(offset))?;

    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;

    log::debug!("parsing xref table at offset {}", offset);

    let mut lines = LineCursor::new(&buf);

    // First non-empty line must be the xref keyword
    loop {
        let (_, line) = lines
            .next()
            .ok_or_else(|| Error::InvalidXref("empty xref section".to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "xref" {
            break;
        }
        if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(Error::InvalidXref(
                "offset points at a cross-reference stream (unsupported)".to_string(),
            ));
        }
        return Err(Error::InvalidXref(format!("expected xref keyword, found {:?}", trimmed)));
    }

    let mut table = XrefTable::new();

    // Subsections until the trailer keyword
    loop {
        let (line_start, line) = lines
            .next()
            .ok_or_else(|| Error::InvalidXref("xref table missing trailer".to_string()))?;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }

        if trimmed.starts_with("trailer") {
            let trailer_body = &buf[line_start + line.find("trailer").unwrap_or(0) + 7..];
            let (_, obj) = parse_object(trailer_body).map_err(|_| {
                Error::InvalidXref("malformed trailer dictionary".to_string())
            })?;
            match obj {
                Object::Dictionary(dict) => table.set_trailer(dict),
                other => {
                    return Err(Error::InvalidXref(format!(
                        "trailer is not a dictionary (found {})",
                        other.type_name()
                    )));
                },
            }
            return Ok(table);
        }

        // Subsection header: "start count"
        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        if parts.len() != 2 {
            return Err(Error::InvalidXref(format!("malformed subsection header: {:?}", trimmed)));
        }
        let start_obj: u32 = parts[0]
            .parse()
            .map_err(|_| Error::InvalidXref(format!("invalid subsection start: {:?}", parts[0])))?;
        let count: u32 = parts[1]
            .parse()
            .map_err(|_| Error::InvalidXref(format!("invalid subsection count: {:?}", parts[1])))?;

        // Guard against memory exhaustion from corrupt headers
        if count > 1_000_000 {
            return Err(Error::InvalidXref("subsection count exceeds limit".to_string()));
        }

        let mut i = 0;
        while i < count {
            let (_, line) = lines.next().ok_or_else(|| {
                Error::InvalidXref(format!("subsection truncated after {} of {} entries", i, count))
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            // Entry line: "oooooooooo ggggg n/f"
            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            if parts.len() != 3 {
                return Err(Error::InvalidXref(format!("malformed entry: {:?}", trimmed)));
            }

            let entry_offset: u64 = parts[0]
                .parse()
                .map_err(|_| Error::InvalidXref(format!("invalid entry offset: {:?}", parts[0])))?;
            let generation: u16 = parts[1].parse().map_err(|_| {
                Error::InvalidXref(format!("invalid entry generation: {:?}", parts[1]))
            })?;
            let in_use = match parts[2] {
                "n" => true,
                "f" => false,
                other => {
                    return Err(Error::InvalidXref(format!("invalid entry flag: {:?}", other)));
                },
            };

            let object_number = start_obj.checked_add(i).ok_or_else(|| {
                Error::InvalidXref(format!("object number overflow at subsection {}", start_obj))
            })?;
            table.add_entry(object_number, XrefEntry::new(entry_offset, generation, in_use));
            i += 1;
        }
    }
}

/// Split bytes into lines, handling LF, CRLF, and lone-CR endings.
fn split_lines(bytes: &[u8]) -> Vec<String> {
    LineCursor::new(bytes).map(|(_, line)| line).collect()
}

/// Line iterator over raw bytes yielding (byte offset, line text).
///
/// Handles all three PDF EOL conventions. The byte offset lets the trailer
/// dictionary be re-parsed from the original buffer.
struct LineCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> LineCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl Iterator for LineCursor<'_> {
    type Item = (usize, String);

    fn next(&mut self) -> Option<(usize, String)> {
        if self.pos >= self.bytes.len() {
            return None;
        }

        let start = self.pos;
        let mut end = start;
        while end < self.bytes.len() && self.bytes[end] != b'\r' && self.bytes[end] != b'\n' {
            end += 1;
        }

        let line = String::from_utf8_lossy(&self.bytes[start..end]).into_owned();

        self.pos = end;
        if self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b'\r'
                && self.pos + 1 < self.bytes.len()
                && self.bytes[self.pos + 1] == b'\n'
            {
                self.pos += 2;
            } else {
                self.pos += 1;
            }
        }

        Some((start, line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_xref_entry_creation() {
        let entry = XrefEntry::new(1234, 0, true);
        assert_eq!(entry.offset, 1234);
        assert_eq!(entry.generation, 0);
        assert!(entry.in_use);
    }

    #[test]
    fn test_table_add_and_get() {
        let mut table = XrefTable::new();
        table.add_entry(5, XrefEntry::new(1234, 0, true));
        assert_eq!(table.len(), 1);
        assert!(table.contains(5));
        assert_eq!(table.get(5).unwrap().offset, 1234);
        assert!(table.get(999).is_none());
    }

    #[test]
    fn test_find_startxref() {
        let pdf = b"%PDF-1.4\ncontent here\nstartxref\n50\n%%EOF";
        let mut cursor = Cursor::new(&pdf[..]);
        assert_eq!(find_startxref(&mut cursor).unwrap(), 50);
    }

    #[test]
    fn test_find_startxref_cr_only_line_endings() {
        let pdf = b"some content\rstartxref\r173\r%%EOF\r";
        let mut cursor = Cursor::new(&pdf[..]);
        assert_eq!(find_startxref(&mut cursor).unwrap(), 173);
    }

    #[test]
    fn test_find_startxref_missing() {
        let pdf = b"%PDF-1.4\nno marker here\n%%EOF";
        let mut cursor = Cursor::new(&pdf[..]);
        assert!(matches!(find_startxref(&mut cursor), Err(Error::InvalidXref(_))));
    }

    #[test]
    fn test_parse_xref_single_subsection() {
        let data = b"xref\n\
            0 3\n\
            0000000000 65535 f \n\
            0000000018 00000 n \n\
            0000000154 00000 n \n\
            trailer\n\
            << /Size 3 /Root 1 0 R >>\n";

        let mut cursor = Cursor::new(&data[..]);
        let table = parse_xref(&mut cursor, 0).unwrap();

        assert_eq!(table.len(), 3);

        let entry0 = table.get(0).unwrap();
        assert_eq!(entry0.generation, 65535);
        assert!(!entry0.in_use);

        let entry1 = table.get(1).unwrap();
        assert_eq!(entry1.offset, 18);
        assert!(entry1.in_use);

        assert_eq!(table.trailer().get("Size").unwrap().as_integer(), Some(3));
        assert!(table.trailer().get("Root").unwrap().as_reference().is_some());
    }

    #[test]
    fn test_parse_xref_multiple_subsections() {
        let data = b"xref\n\
            0 2\n\
            0000000000 65535 f \n\
            0000000018 00000 n \n\
            5 3\n\
            0000000200 00000 n \n\
            0000000300 00000 n \n\
            0000000400 00000 n \n\
            trailer\n\
            << /Size 8 >>\n";

        let mut cursor = Cursor::new(&data[..]);
        let table = parse_xref(&mut cursor, 0).unwrap();

        assert_eq!(table.len(), 5);
        assert_eq!(table.get(5).unwrap().offset, 200);
        assert_eq!(table.get(6).unwrap().offset, 300);
        assert_eq!(table.get(7).unwrap().offset, 400);
        assert!(table.get(2).is_none());
        assert!(table.get(4).is_none());
    }

    #[test]
    fn test_parse_xref_digit_first_is_xref_stream() {
        // A digit where "xref" is expected means an xref stream object
        let data = b"12 0 obj\n<< /Type /XRef >>\nendobj\n";
        let mut cursor = Cursor::new(&data[..]);
        match parse_xref(&mut cursor, 0) {
            Err(Error::InvalidXref(msg)) => assert!(msg.contains("stream")),
            other => panic!("expected InvalidXref, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_xref_missing_keyword() {
        let data = b"notxref\n0 1\n0000000000 65535 f \ntrailer\n<< >>\n";
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(parse_xref(&mut cursor, 0), Err(Error::InvalidXref(_))));
    }

    #[test]
    fn test_parse_xref_malformed_entry() {
        let data = b"xref\n\
            0 2\n\
            0000000000 65535 f \n\
            garbage entry here extra\n\
            trailer\n\
            << >>\n";

        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(parse_xref(&mut cursor, 0), Err(Error::InvalidXref(_))));
    }

    #[test]
    fn test_parse_xref_truncated_subsection() {
        let data = b"xref\n\
            0 3\n\
            0000000000 65535 f \n\
            0000000018 00000 n \n";

        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(parse_xref(&mut cursor, 0), Err(Error::InvalidXref(_))));
    }

    #[test]
    fn test_parse_xref_subsection_start_overflow() {
        let data = b"xref\n\
            4294967295 2\n\
            0000000018 00000 n \n\
            0000000154 00000 n \n\
            trailer\n\
            << >>\n";

        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(parse_xref(&mut cursor, 0), Err(Error::InvalidXref(_))));
    }

    #[test]
    fn test_parse_xref_excessive_count() {
        let data = b"xref\n0 2000000\n0000000000 65535 f \ntrailer\n<< >>\n";
        let mut cursor = Cursor::new(&data[..]);
        assert!(parse_xref(&mut cursor, 0).is_err());
    }

    #[test]
    fn test_parse_xref_cr_only_line_endings() {
        let data = b"xref\r0 2\r0000000000 65535 f \r0000000018 00000 n \rtrailer\r<< /Size 2 >>\r";
        let mut cursor = Cursor::new(&data[..]);
        let table = parse_xref(&mut cursor, 0).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1).unwrap().offset, 18);
    }

    #[test]
    fn test_split_lines_mixed_endings() {
        let lines = split_lines(b"line1\rline2\nline3\r\nline4");
        assert_eq!(lines, vec!["line1", "line2", "line3", "line4"]);
    }
}
