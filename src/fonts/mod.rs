//! Font resolution for text extraction.
//!
//! A font, for extraction purposes, is just a resource name plus an
//! optional ToUnicode CMap. The resolver walks `resources./Font/<name>`
//! and the font's `/ToUnicode` stream; any failure along the way
//! degrades to a CMap-less [`FontInfo`] so text extraction can still
//! fall back to byte-string heuristics. Resolution never errors.

pub mod cmap;
pub mod encoding;

use crate::document::PdfReader;
use crate::object::Object;
use cmap::ToUnicodeCMap;
use std::collections::HashMap;
use std::io::{Read, Seek};

pub use cmap::{parse_tounicode_cmap, CMapRange};

/// What text extraction needs to know about a font.
#[derive(Debug, Clone, PartialEq)]
pub struct FontInfo {
    /// Font resource name (the `/F1` in `/F1 12 Tf`)
    pub name: String,
    /// Parsed ToUnicode CMap when the font carries one
    pub to_unicode: Option<ToUnicodeCMap>,
}

impl FontInfo {
    /// A font with no ToUnicode mapping.
    pub fn without_cmap(name: &str) -> Self {
        Self {
            name: name.to_string(),
            to_unicode: None,
        }
    }
}

/// Resolves and caches fonts by resource name.
#[derive(Debug, Default)]
pub struct FontResolver {
    cache: HashMap<String, FontInfo>,
}

impl FontResolver {
    /// New resolver with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a font by resource name, consulting the cache first.
    pub fn get_font<R: Read + Seek>(
        &mut self,
        name: &str,
        resources: &HashMap<String, Object>,
        reader: &mut PdfReader<R>,
    ) -> FontInfo {
        if let Some(font) = self.cache.get(name) {
            return font.clone();
        }

        let font = resolve_font(name, resources, reader)
            .unwrap_or_else(|| FontInfo::without_cmap(name));
        self.cache.insert(name.to_string(), font.clone());
        font
    }
}

/// Walk `resources./Font/<name>` and its `/ToUnicode` stream.
///
/// Returns None when anything along the path is missing or malformed.
fn resolve_font<R: Read + Seek>(
    name: &str,
    resources: &HashMap<String, Object>,
    reader: &mut PdfReader<R>,
) -> Option<FontInfo> {
    let fonts = resources.get("Font")?;
    let fonts = reader.resolve(fonts).ok()?;
    let fonts = fonts.as_dict()?;

    let entry = fonts.get(name)?;
    let font_dict = reader.resolve(entry).ok()?;
    let font_dict = font_dict.as_dict()?;

    let to_unicode = match font_dict.get("ToUnicode") {
        Some(obj) => load_cmap(obj, reader),
        None => None,
    };

    Some(FontInfo {
        name: name.to_string(),
        to_unicode,
    })
}

fn load_cmap<R: Read + Seek>(obj: &Object, reader: &mut PdfReader<R>) -> Option<ToUnicodeCMap> {
    let stream = reader.resolve(obj).ok()?;
    let (dict, data) = match &stream {
        Object::Stream { dict, data } => (dict, data),
        _ => return None,
    };

    // /Filter itself may be an indirect reference
    let filter = match dict.get("Filter") {
        Some(f) => Some(reader.resolve(f).ok()?),
        None => None,
    };

    let decoded = match crate::decoders::decode_stream(data, filter.as_ref()) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("ToUnicode stream failed to decode: {}", e);
            return None;
        },
    };

    match cmap::parse_tounicode_cmap(&decoded) {
        Ok(parsed) if !parsed.is_empty() => Some(parsed),
        Ok(_) => None,
        Err(e) => {
            log::debug!("ToUnicode CMap failed to parse: {}", e);
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_info_without_cmap() {
        let font = FontInfo::without_cmap("F1");
        assert_eq!(font.name, "F1");
        assert!(font.to_unicode.is_none());
    }
}
