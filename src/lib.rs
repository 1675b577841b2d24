//! # PDF Lector
//!
//! A PDF reading library focused on faithful content extraction: text
//! with positions, placed images, and a reconstructed page layout.
//!
//! ## Features
//!
//! - **Object model**: full PDF object parsing (dictionaries, arrays,
//!   streams, references) over a nom lexer
//! - **Cross-reference tables**: classic xref sections with trailer
//!   dictionaries
//! - **Stream decoding**: FlateDecode, with unknown filters passed
//!   through rather than failing the document
//! - **Text extraction**: a content-stream interpreter tracking the
//!   graphics and text state machines, ToUnicode CMap decoding, and
//!   byte-string encoding heuristics (UTF-16, PDFDocEncoding, Latin-1)
//! - **Image extraction**: XObject images with their page placement
//!   derived from the current transformation matrix
//! - **Layout reconstruction**: reading-order sorting, overlap
//!   detection, and optional vertical repositioning strategies
//! - **Encryption**: RC4 and AES-CBC standard security handlers
//!   (R2 through R4) with user and owner password authentication
//!
//! ## Quick Start
//!
//! ```ignore
//! use pdf_lector::PdfReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = PdfReader::open("report.pdf")?;
//!
//! if reader.is_encrypted() {
//!     reader.authenticate_with_password(b"secret")?;
//! }
//!
//! for page in 0..reader.page_count()? {
//!     let layout = reader.extract_page_layout(page)?;
//!     for block in layout.sorted_content_blocks() {
//!         println!("{:?} at {:?}", block.block_type(), block.bounds());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Core PDF parsing
pub mod document;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod xref;

// Stream decoders
pub mod decoders;

// Encryption support
pub mod encryption;

// Content interpretation
pub mod content;
pub mod fonts;

// Layout analysis
pub mod geometry;
pub mod layout;

// Re-exports
pub use content::{ImageFormat, ImageInfo, PlacedImage, TextElement};
pub use document::PdfReader;
pub use encryption::{Algorithm, EncryptionInfo, Permissions};
pub use error::{Error, Result};
pub use geometry::{Point, Rect};
pub use layout::{
    BlockType, ContentBlock, ImageBlock, LayoutOptions, LayoutStrategy, Overlap, PageLayout,
    TextBlock,
};
pub use object::{Object, ObjectRef};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
