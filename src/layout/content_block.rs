//! Content blocks: the units of page layout.
//!
//! Text elements coming out of the interpreter are per-string; layout
//! works on coarser blocks. [`group_text_elements`] merges consecutive
//! elements that share a font and size into paragraphs, and images keep
//! their placement rectangle. Both implement [`ContentBlock`] so the
//! page can order and collide them uniformly.

use crate::content::graphics_state::Matrix;
use crate::content::images::{ImageInfo, PlacedImage};
use crate::content::text::TextElement;
use crate::geometry::{Point, Rect};

/// Kind of content in a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// A grouped run of text
    Text,
    /// A placed image
    Image,
}

/// Anything that occupies a rectangle on the page.
pub trait ContentBlock {
    /// Bounding rectangle in page space.
    fn bounds(&self) -> Rect;

    /// Whether this is text or an image.
    fn block_type(&self) -> BlockType;

    /// Bottom-left corner of the block.
    fn position(&self) -> Point {
        let b = self.bounds();
        Point::new(b.x, b.y)
    }
}

/// A paragraph-like group of text elements.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Concatenated text, lines separated by newlines
    pub text: String,
    /// Bounding rectangle covering every grouped element
    pub bounds: Rect,
    /// Font resource name shared by the group
    pub font_name: Option<String>,
    /// Font size shared by the group
    pub font_size: f32,
}

impl ContentBlock for TextBlock {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn block_type(&self) -> BlockType {
        BlockType::Text
    }
}

/// An image block carrying its placement and full transform.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlock {
    /// The image data and pixel description
    pub info: ImageInfo,
    /// X of the placement's minimum corner
    pub x: f32,
    /// Y of the placement's minimum corner
    pub y: f32,
    /// Placed width
    pub width: f32,
    /// Placed height
    pub height: f32,
    /// CTM at the image's `Do`
    pub transform: Matrix,
}

impl From<PlacedImage> for ImageBlock {
    fn from(placed: PlacedImage) -> Self {
        Self {
            info: placed.info,
            x: placed.x,
            y: placed.y,
            width: placed.width,
            height: placed.height,
            transform: placed.transform,
        }
    }
}

impl ContentBlock for ImageBlock {
    fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    fn block_type(&self) -> BlockType {
        BlockType::Image
    }
}

/// Maximum vertical gap between elements of one block, in font sizes.
const LINE_GAP_FACTOR: f32 = 1.5;

/// Average glyph width as a fraction of the font size, for estimating
/// text extents without font metrics.
const GLYPH_WIDTH_FACTOR: f32 = 0.5;

/// Group consecutive text elements into blocks.
///
/// Elements join the current block while the font name and size match
/// and the vertical gap stays within 1.5 font sizes. Element widths are
/// estimated from character counts since the extractor carries no glyph
/// metrics.
pub fn group_text_elements(elements: &[TextElement]) -> Vec<TextBlock> {
    let mut blocks: Vec<TextBlock> = Vec::new();
    let mut last_y: f32 = 0.0;

    for element in elements {
        let rect = element_rect(element);

        let joins = match blocks.last() {
            Some(block) => {
                block.font_name == element.font_name
                    && block.font_size == element.font_size
                    && (last_y - element.y).abs() <= LINE_GAP_FACTOR * element.font_size
            },
            None => false,
        };

        if joins {
            let block = blocks.last_mut().expect("checked above");
            if element.y == last_y {
                block.text.push_str(&element.text);
            } else {
                block.text.push('\n');
                block.text.push_str(&element.text);
            }
            block.bounds = block.bounds.union(&rect);
        } else {
            blocks.push(TextBlock {
                text: element.text.clone(),
                bounds: rect,
                font_name: element.font_name.clone(),
                font_size: element.font_size,
            });
        }

        last_y = element.y;
    }

    blocks
}

/// Estimated rectangle of a single element: the baseline origin plus
/// one font size of height and a width proportional to its length.
fn element_rect(element: &TextElement) -> Rect {
    let width = GLYPH_WIDTH_FACTOR * element.font_size * element.text.chars().count() as f32;
    Rect::new(element.x, element.y, width, element.font_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(text: &str, x: f32, y: f32, font: &str, size: f32) -> TextElement {
        TextElement {
            text: text.to_string(),
            x,
            y,
            font_name: Some(font.to_string()),
            font_size: size,
        }
    }

    #[test]
    fn test_group_empty() {
        assert!(group_text_elements(&[]).is_empty());
    }

    #[test]
    fn test_group_single_element() {
        let blocks = group_text_elements(&[element("Hello", 10.0, 700.0, "F1", 12.0)]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "Hello");
        assert_eq!(blocks[0].bounds.x, 10.0);
        assert_eq!(blocks[0].bounds.y, 700.0);
        // 5 chars * 0.5 * 12pt
        assert_eq!(blocks[0].bounds.width, 30.0);
        assert_eq!(blocks[0].bounds.height, 12.0);
    }

    #[test]
    fn test_consecutive_lines_grouped() {
        let blocks = group_text_elements(&[
            element("line one", 10.0, 700.0, "F1", 12.0),
            element("line two", 10.0, 686.0, "F1", 12.0),
        ]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "line one\nline two");
        // Union spans both lines
        assert_eq!(blocks[0].bounds.y, 686.0);
        assert_eq!(blocks[0].bounds.top(), 712.0);
    }

    #[test]
    fn test_same_line_joined_without_newline() {
        let blocks = group_text_elements(&[
            element("Hel", 10.0, 700.0, "F1", 12.0),
            element("lo", 28.0, 700.0, "F1", 12.0),
        ]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "Hello");
    }

    #[test]
    fn test_font_change_breaks_block() {
        let blocks = group_text_elements(&[
            element("heading", 10.0, 700.0, "F2", 18.0),
            element("body", 10.0, 690.0, "F1", 12.0),
        ]);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_large_gap_breaks_block() {
        // Gap of 30 > 1.5 * 12
        let blocks = group_text_elements(&[
            element("para one", 10.0, 700.0, "F1", 12.0),
            element("para two", 10.0, 670.0, "F1", 12.0),
        ]);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_gap_at_threshold_groups() {
        // Gap of exactly 18 == 1.5 * 12
        let blocks = group_text_elements(&[
            element("a", 10.0, 700.0, "F1", 12.0),
            element("b", 10.0, 682.0, "F1", 12.0),
        ]);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_image_block_bounds() {
        use crate::content::images::ImageFormat;

        let block = ImageBlock {
            info: ImageInfo {
                name: "Im1".to_string(),
                width: 100,
                height: 50,
                color_space: None,
                bits_per_component: 8,
                format: ImageFormat::Jpeg,
                data: Vec::new(),
            },
            x: 10.0,
            y: 20.0,
            width: 200.0,
            height: 100.0,
            transform: Matrix::identity(),
        };
        assert_eq!(block.bounds(), Rect::new(10.0, 20.0, 200.0, 100.0));
        assert_eq!(block.block_type(), BlockType::Image);
        let pos = block.position();
        assert_eq!((pos.x, pos.y), (10.0, 20.0));
    }
}
