//! Page layout reconstruction.
//!
//! Groups extracted text into blocks, orders content for reading,
//! detects overlapping placements, and optionally repositions blocks
//! vertically.

pub mod content_block;
pub mod page_layout;

pub use content_block::{group_text_elements, BlockType, ContentBlock, ImageBlock, TextBlock};
pub use page_layout::{LayoutOptions, LayoutStrategy, Overlap, PageLayout};
