//! Geometric primitives for layout analysis.
//!
//! All coordinates are in PDF user space: the origin is the bottom-left
//! corner of the page and y grows upward. A [`Rect`]'s `y` is therefore its
//! bottom edge and `top()` is `y + height`.

/// A 2D point in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// X coordinate of the left edge
    pub x: f32,
    /// Y coordinate of the bottom edge
    pub y: f32,
    /// Width of rectangle
    pub width: f32,
    /// Height of rectangle
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from its bottom-left corner and dimensions.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from two opposite corner points.
    pub fn from_points(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        let x = x0.min(x1);
        let y = y0.min(y1);
        Self {
            x,
            y,
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    /// Left edge x-coordinate.
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Right edge x-coordinate.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate.
    pub fn bottom(&self) -> f32 {
        self.y
    }

    /// Top edge y-coordinate (`y + height` in PDF space).
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Center point.
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Check if this rectangle intersects another with positive area.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.bottom() < other.top()
            && self.top() > other.bottom()
    }

    /// Area of the intersection, 0.0 when the rectangles do not overlap.
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let overlap_w = self.right().min(other.right()) - self.left().max(other.left());
        let overlap_h = self.top().min(other.top()) - self.bottom().max(other.bottom());
        if overlap_w > 0.0 && overlap_h > 0.0 {
            overlap_w * overlap_h
        } else {
            0.0
        }
    }

    /// Check if this rectangle contains a point (edges inclusive).
    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.bottom() && p.y <= self.top()
    }

    /// Smallest rectangle containing both rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.left().min(other.left());
        let y0 = self.bottom().min(other.bottom());
        let x1 = self.right().max(other.right());
        let y1 = self.top().max(other.top());
        Rect::from_points(x0, y0, x1, y1)
    }

    /// Area of the rectangle.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}
