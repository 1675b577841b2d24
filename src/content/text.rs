//! Text extraction from content streams.
//!
//! Executes the text operators of a parsed content stream and emits one
//! [`TextElement`] per shown string, positioned at the text matrix's
//! translation at the time of emission. The CTM is tracked for `q/Q/cm`
//! balance but is not reapplied to text coordinates: positions stay in
//! the text space most PDF producers emit page coordinates in.
//!
//! TJ kerning offsets are parsed but not applied to positions; each
//! string member of a TJ array becomes its own element at the current
//! text position. This is a documented limitation of the extractor.

use crate::content::graphics_state::{GraphicsStateStack, Matrix, TextState};
use crate::content::operators::{Operator, TjItem};
use crate::fonts::{encoding, FontInfo};
use std::collections::HashMap;

/// A positioned run of text extracted from a content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    /// Decoded Unicode text
    pub text: String,
    /// X coordinate in text space
    pub x: f32,
    /// Y coordinate in text space
    pub y: f32,
    /// Font resource name active when the text was shown
    pub font_name: Option<String>,
    /// Font size active when the text was shown
    pub font_size: f32,
}

/// Run the text operators and collect positioned elements.
///
/// `fonts` maps font resource names to resolved [`FontInfo`]; a name
/// missing from the map simply decodes through the byte-string
/// heuristics instead of a CMap.
pub fn extract_text_elements(
    operators: &[Operator],
    fonts: &HashMap<String, FontInfo>,
) -> Vec<TextElement> {
    let mut elements = Vec::new();
    let mut stack = GraphicsStateStack::new();
    let mut text = TextState::new();

    for op in operators {
        match op {
            Operator::SaveState => stack.save(),
            Operator::RestoreState => stack.restore(),
            Operator::Cm { a, b, c, d, e, f } => {
                let m = Matrix {
                    a: *a,
                    b: *b,
                    c: *c,
                    d: *d,
                    e: *e,
                    f: *f,
                };
                let state = stack.current_mut();
                state.ctm = state.ctm.multiply(&m);
            },

            Operator::BeginText => {
                text.text_matrix = Matrix::identity();
                text.line_matrix = Matrix::identity();
            },
            Operator::EndText => {},

            Operator::Tf { font, size } => {
                text.font_name = Some(font.clone());
                text.font_size = *size;
            },
            Operator::Td { tx, ty } => move_text_position(&mut text, *tx, *ty),
            Operator::TD { tx, ty } => {
                text.leading = -ty;
                move_text_position(&mut text, *tx, *ty);
            },
            Operator::Tm { a, b, c, d, e, f } => {
                let m = Matrix {
                    a: *a,
                    b: *b,
                    c: *c,
                    d: *d,
                    e: *e,
                    f: *f,
                };
                text.text_matrix = m;
                text.line_matrix = m;
            },
            Operator::TStar => {
                let leading = text.leading;
                move_text_position(&mut text, 0.0, -leading);
            },

            Operator::Tc { char_space } => text.char_space = *char_space,
            Operator::Tw { word_space } => text.word_space = *word_space,
            Operator::TL { leading } => text.leading = *leading,

            Operator::Tj { text: bytes } => {
                emit(&mut elements, &text, bytes, fonts);
            },
            Operator::Quote { text: bytes } => {
                let leading = text.leading;
                move_text_position(&mut text, 0.0, -leading);
                emit(&mut elements, &text, bytes, fonts);
            },
            Operator::DoubleQuote {
                word_space,
                char_space,
                text: bytes,
            } => {
                text.word_space = *word_space;
                text.char_space = *char_space;
                let leading = text.leading;
                move_text_position(&mut text, 0.0, -leading);
                emit(&mut elements, &text, bytes, fonts);
            },
            Operator::TJ { array } => {
                for item in array {
                    match item {
                        TjItem::Text(bytes) => emit(&mut elements, &text, bytes, fonts),
                        // Kerning offsets are not applied to positions
                        TjItem::Offset(_) => {},
                    }
                }
            },

            Operator::Do { .. } | Operator::Other { .. } => {},
        }
    }

    elements
}

/// Td: translate the line matrix and restart the text matrix from it.
fn move_text_position(text: &mut TextState, tx: f32, ty: f32) {
    text.line_matrix = Matrix::translation(tx, ty).multiply(&text.line_matrix);
    text.text_matrix = text.line_matrix;
}

fn emit(
    elements: &mut Vec<TextElement>,
    text: &TextState,
    bytes: &[u8],
    fonts: &HashMap<String, FontInfo>,
) {
    if bytes.is_empty() {
        return;
    }

    let font = text.font_name.as_ref().and_then(|name| fonts.get(name));
    let decoded = decode_text(bytes, font);

    elements.push(TextElement {
        text: decoded,
        x: text.text_matrix.e,
        y: text.text_matrix.f,
        font_name: text.font_name.clone(),
        font_size: text.font_size,
    });
}

/// Decode string bytes through the font's ToUnicode CMap when it has
/// one, otherwise through the byte-string heuristics.
fn decode_text(bytes: &[u8], font: Option<&FontInfo>) -> String {
    match font.and_then(|f| f.to_unicode.as_ref()) {
        Some(cmap) => {
            let mut result = String::new();
            let mut i = 0;
            while i < bytes.len() {
                // Two-byte big-endian CIDs; a trailing odd byte stands alone
                let cid = if i + 1 < bytes.len() {
                    u16::from_be_bytes([bytes[i], bytes[i + 1]]) as u32
                } else {
                    bytes[i] as u32
                };
                match cmap.lookup(cid) {
                    Some(ch) => result.push(ch),
                    None => {
                        // Unmapped CID: fall back to the code point itself
                        if let Some(ch) = char::from_u32(cid) {
                            result.push(ch);
                        }
                    },
                }
                i += 2;
            }
            result
        },
        None => encoding::decode_bytes(bytes),
    }
}
