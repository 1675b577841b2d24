//! Content stream operators.
//!
//! The subset of ISO 32000-1 Appendix A operators that drive text and
//! image extraction. Everything else a content stream may contain is
//! preserved as [`Operator::Other`] so the interpreters can skip it
//! without losing their place in the stream.

/// A content stream operator with its decoded operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Concatenate matrix onto the CTM (cm)
    Cm {
        /// Matrix element a
        a: f32,
        /// Matrix element b
        b: f32,
        /// Matrix element c
        c: f32,
        /// Matrix element d
        d: f32,
        /// Matrix element e (x translation)
        e: f32,
        /// Matrix element f (y translation)
        f: f32,
    },

    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,

    /// Set font and size (Tf)
    Tf {
        /// Font resource name
        font: String,
        /// Font size
        size: f32,
    },
    /// Move text position (Td)
    Td {
        /// Horizontal offset
        tx: f32,
        /// Vertical offset
        ty: f32,
    },
    /// Move text position and set leading (TD)
    TD {
        /// Horizontal offset
        tx: f32,
        /// Vertical offset
        ty: f32,
    },
    /// Set text matrix and line matrix (Tm)
    Tm {
        /// Matrix element a
        a: f32,
        /// Matrix element b
        b: f32,
        /// Matrix element c
        c: f32,
        /// Matrix element d
        d: f32,
        /// Matrix element e (x translation)
        e: f32,
        /// Matrix element f (y translation)
        f: f32,
    },
    /// Move to start of next line (T*)
    TStar,

    /// Show text string (Tj)
    Tj {
        /// Raw string bytes as they appear in the stream
        text: Vec<u8>,
    },
    /// Show text with individual glyph positioning (TJ)
    TJ {
        /// Strings interleaved with positioning adjustments
        array: Vec<TjItem>,
    },
    /// Move to next line and show text (')
    Quote {
        /// Raw string bytes
        text: Vec<u8>,
    },
    /// Set word and character spacing, move to next line, show text (")
    DoubleQuote {
        /// Word spacing
        word_space: f32,
        /// Character spacing
        char_space: f32,
        /// Raw string bytes
        text: Vec<u8>,
    },

    /// Set character spacing (Tc)
    Tc {
        /// Character spacing
        char_space: f32,
    },
    /// Set word spacing (Tw)
    Tw {
        /// Word spacing
        word_space: f32,
    },
    /// Set text leading (TL)
    TL {
        /// Text leading
        leading: f32,
    },

    /// Paint XObject (Do)
    Do {
        /// XObject resource name
        name: String,
    },

    /// Any operator the interpreters do not act on
    Other {
        /// Operator name as written in the stream
        name: String,
    },
}

/// Element of a TJ array.
#[derive(Debug, Clone, PartialEq)]
pub enum TjItem {
    /// A string to show
    Text(Vec<u8>),
    /// Positioning adjustment in thousandths of text space
    Offset(f32),
}
