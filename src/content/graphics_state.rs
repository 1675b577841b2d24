//! Graphics and text state for content stream execution.
//!
//! Tracks the parameters that `q`/`Q`/`cm` and the text-state operators
//! mutate while a content stream runs.

use crate::geometry::Point;

/// A 2D transformation matrix.
///
/// PDF matrices have the form:
/// ```text
/// [ a  b  0 ]
/// [ c  d  0 ]
/// [ e  f  1 ]
/// ```
///
/// (a,b,c,d) carry scaling/rotation/skew and (e,f) translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// Horizontal scaling component
    pub a: f32,
    /// Rotation/skew component
    pub b: f32,
    /// Rotation/skew component
    pub c: f32,
    /// Vertical scaling component
    pub d: f32,
    /// Horizontal translation
    pub e: f32,
    /// Vertical translation
    pub f: f32,
}

impl Matrix {
    /// The identity matrix.
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// A pure translation matrix.
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: tx,
            f: ty,
        }
    }

    /// A pure scaling matrix.
    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Multiply this matrix with another.
    ///
    /// Not commutative. `a.multiply(&b)` transforms points as if `a` were
    /// applied first and `b` second, which is how `cm` composes a new
    /// matrix onto the CTM.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Transform a point through this matrix.
    pub fn transform_point(&self, x: f32, y: f32) -> Point {
        Point {
            x: self.a * x + self.c * y + self.e,
            y: self.b * x + self.d * y + self.f,
        }
    }

    /// Determinant of the 2x2 part.
    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// Graphics state parameters.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    /// Current transformation matrix (user space to device space)
    pub ctm: Matrix,
    /// Fill color space name (DeviceGray by default)
    pub fill_color_space: String,
    /// Fill color as RGB
    pub fill_color: (f32, f32, f32),
    /// Stroke color as RGB
    pub stroke_color: (f32, f32, f32),
    /// Line width
    pub line_width: f32,
}

impl GraphicsState {
    /// Graphics state with PDF default values.
    pub fn new() -> Self {
        Self {
            ctm: Matrix::identity(),
            fill_color_space: "DeviceGray".to_string(),
            fill_color: (0.0, 0.0, 0.0),
            stroke_color: (0.0, 0.0, 0.0),
            line_width: 1.0,
        }
    }
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Text state parameters, live between `BT` and `ET`.
#[derive(Debug, Clone)]
pub struct TextState {
    /// Text matrix (text space to user space)
    pub text_matrix: Matrix,
    /// Line matrix (start-of-line position)
    pub line_matrix: Matrix,
    /// Current font name as selected by Tf
    pub font_name: Option<String>,
    /// Current font size
    pub font_size: f32,
    /// Character spacing (Tc)
    pub char_space: f32,
    /// Word spacing (Tw)
    pub word_space: f32,
    /// Text leading (TL)
    pub leading: f32,
}

impl TextState {
    /// Text state with PDF default values.
    pub fn new() -> Self {
        Self {
            text_matrix: Matrix::identity(),
            line_matrix: Matrix::identity(),
            font_name: None,
            font_size: 12.0,
            char_space: 0.0,
            word_space: 0.0,
            leading: 0.0,
        }
    }
}

impl Default for TextState {
    fn default() -> Self {
        Self::new()
    }
}

/// Stack of graphics states for the `q`/`Q` operators.
///
/// Save pushes a full value copy; restore pops it. A restore on the last
/// remaining state is a no-op, so unbalanced `Q`s cannot empty the stack.
#[derive(Debug, Clone)]
pub struct GraphicsStateStack {
    stack: Vec<GraphicsState>,
}

impl GraphicsStateStack {
    /// New stack holding one default state.
    pub fn new() -> Self {
        Self {
            stack: vec![GraphicsState::new()],
        }
    }

    /// The current graphics state.
    pub fn current(&self) -> &GraphicsState {
        self.stack.last().expect("stack is never empty")
    }

    /// Mutable access to the current graphics state.
    pub fn current_mut(&mut self) -> &mut GraphicsState {
        self.stack.last_mut().expect("stack is never empty")
    }

    /// Save the current state (`q`).
    pub fn save(&mut self) {
        let state = self.current().clone();
        self.stack.push(state);
    }

    /// Restore the previous state (`Q`). No-op at depth 1.
    pub fn restore(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Current stack depth, always at least 1.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Default for GraphicsStateStack {
    fn default() -> Self {
        Self::new()
    }
}
