//! Content stream parsing and execution.
//!
//! Parses page content streams into typed operators and runs two
//! independent interpreter passes over them: text extraction and image
//! extraction.

pub mod graphics_state;
pub mod images;
pub mod operators;
pub mod parser;
pub mod text;

pub use graphics_state::{GraphicsState, GraphicsStateStack, Matrix, TextState};
pub use images::{ImageFormat, ImageInfo, PlacedImage};
pub use operators::{Operator, TjItem};
pub use parser::parse_content_stream;
pub use text::{extract_text_elements, TextElement};
