//! Page layout: ordering, overlap detection, and adjustment.
//!
//! A [`PageLayout`] holds the text blocks and images extracted from one
//! page. Blocks are ordered top-to-bottom (PDF space, so by descending
//! top edge) with a small tolerance so blocks on the same visual line
//! sort left-to-right. Layout adjustment mutates Y coordinates only;
//! horizontal placement is never touched.

use crate::layout::content_block::{ContentBlock, ImageBlock, TextBlock};
use std::cmp::Ordering;

/// Vertical tolerance when deciding two blocks share a line.
const ROW_EPSILON: f32 = 1.0;

/// The extracted content of a single page.
#[derive(Debug, Clone)]
pub struct PageLayout {
    /// Zero-based page index
    pub page_num: usize,
    /// Page width from the MediaBox
    pub width: f32,
    /// Page height from the MediaBox
    pub height: f32,
    /// Grouped text blocks
    pub text_blocks: Vec<TextBlock>,
    /// Placed images
    pub images: Vec<ImageBlock>,
}

/// A pair of blocks whose rectangles intersect with positive area.
///
/// Indices refer to the order returned by
/// [`PageLayout::sorted_content_blocks`].
#[derive(Debug, Clone, PartialEq)]
pub struct Overlap {
    /// Index of the earlier block in reading order
    pub first: usize,
    /// Index of the later block
    pub second: usize,
    /// Intersection area
    pub area: f32,
}

/// How [`PageLayout::adjust_layout`] repositions blocks vertically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStrategy {
    /// Stack blocks from the top margin with `min_spacing` between them
    Compact,
    /// Distribute leftover vertical space evenly; falls back to Compact
    /// when the content does not fit
    EvenSpacing,
    /// Push blocks down only as far as needed to remove overlaps
    FlowDown,
    /// Leave everything where it is
    PreservePosition,
}

/// Options for layout adjustment.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Repositioning strategy
    pub strategy: LayoutStrategy,
    /// Minimum vertical gap between blocks
    pub min_spacing: f32,
    /// Distance from the page top to the first block's top edge
    pub top_margin: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            strategy: LayoutStrategy::PreservePosition,
            min_spacing: 2.0,
            top_margin: 36.0,
        }
    }
}

/// Internal handle to either block list, so adjustment can mutate
/// through one code path.
#[derive(Debug, Clone, Copy)]
enum BlockKey {
    Text(usize),
    Image(usize),
}

impl PageLayout {
    /// All blocks in reading order: top edge descending, with blocks
    /// within [`ROW_EPSILON`] of each other ordered left-to-right.
    pub fn sorted_content_blocks(&self) -> Vec<&dyn ContentBlock> {
        let mut blocks: Vec<&dyn ContentBlock> = Vec::new();
        for block in &self.text_blocks {
            blocks.push(block);
        }
        for image in &self.images {
            blocks.push(image);
        }

        blocks.sort_by(|a, b| compare_reading_order(&a.bounds(), &b.bounds()));
        blocks
    }

    /// Find every pair of blocks that overlap with positive area.
    pub fn detect_overlaps(&self) -> Vec<Overlap> {
        let blocks = self.sorted_content_blocks();
        let mut overlaps = Vec::new();

        for i in 0..blocks.len() {
            for j in (i + 1)..blocks.len() {
                let area = blocks[i].bounds().intersection_area(&blocks[j].bounds());
                if area > 0.0 {
                    overlaps.push(Overlap {
                        first: i,
                        second: j,
                        area,
                    });
                }
            }
        }

        overlaps
    }

    /// Reposition blocks vertically according to the chosen strategy.
    pub fn adjust_layout(&mut self, options: &LayoutOptions) {
        let order = self.sorted_keys();
        if order.is_empty() {
            return;
        }

        match options.strategy {
            LayoutStrategy::PreservePosition => {},
            LayoutStrategy::Compact => self.compact(&order, options),
            LayoutStrategy::FlowDown => self.flow_down(&order, options),
            LayoutStrategy::EvenSpacing => {
                let total: f32 = order.iter().map(|&k| self.block_bounds(k).height).sum();
                let available = self.height - options.top_margin;
                let required = total + options.min_spacing * (order.len() - 1) as f32;

                if required > available {
                    log::debug!(
                        "even spacing needs {} of {} available, falling back to compact",
                        required,
                        available
                    );
                    self.compact(&order, options);
                } else {
                    self.even_spacing(&order, options, total, available);
                }
            },
        }
    }

    /// Stack blocks from the top margin downward.
    fn compact(&mut self, order: &[BlockKey], options: &LayoutOptions) {
        let mut cursor = self.height - options.top_margin;
        for &key in order {
            let height = self.block_bounds(key).height;
            self.set_block_top(key, cursor);
            cursor -= height + options.min_spacing;
        }
    }

    /// Push blocks down just enough to clear the one above. The first
    /// block never moves; only overlaps are resolved.
    fn flow_down(&mut self, order: &[BlockKey], options: &LayoutOptions) {
        let mut limit = f32::INFINITY;
        for &key in order {
            let bounds = self.block_bounds(key);
            let new_top = bounds.top().min(limit);
            if new_top < bounds.top() {
                self.set_block_top(key, new_top);
            }
            limit = new_top - bounds.height - options.min_spacing;
        }
    }

    /// Distribute leftover space evenly between blocks.
    fn even_spacing(
        &mut self,
        order: &[BlockKey],
        options: &LayoutOptions,
        total: f32,
        available: f32,
    ) {
        let gap = if order.len() > 1 {
            (available - total) / (order.len() - 1) as f32
        } else {
            options.min_spacing
        };

        let mut cursor = self.height - options.top_margin;
        for &key in order {
            let height = self.block_bounds(key).height;
            self.set_block_top(key, cursor);
            cursor -= height + gap;
        }
    }

    fn sorted_keys(&self) -> Vec<BlockKey> {
        let mut keys: Vec<BlockKey> = (0..self.text_blocks.len())
            .map(BlockKey::Text)
            .chain((0..self.images.len()).map(BlockKey::Image))
            .collect();
        keys.sort_by(|&a, &b| {
            compare_reading_order(&self.block_bounds(a), &self.block_bounds(b))
        });
        keys
    }

    fn block_bounds(&self, key: BlockKey) -> crate::geometry::Rect {
        match key {
            BlockKey::Text(i) => self.text_blocks[i].bounds(),
            BlockKey::Image(i) => self.images[i].bounds(),
        }
    }

    /// Move a block so its top edge sits at `new_top`. Y only.
    fn set_block_top(&mut self, key: BlockKey, new_top: f32) {
        match key {
            BlockKey::Text(i) => {
                let height = self.text_blocks[i].bounds.height;
                self.text_blocks[i].bounds.y = new_top - height;
            },
            BlockKey::Image(i) => {
                let height = self.images[i].height;
                self.images[i].y = new_top - height;
            },
        }
    }
}

fn compare_reading_order(a: &crate::geometry::Rect, b: &crate::geometry::Rect) -> Ordering {
    if (a.top() - b.top()).abs() <= ROW_EPSILON {
        a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal)
    } else {
        b.top().partial_cmp(&a.top()).unwrap_or(Ordering::Equal)
    }
}
