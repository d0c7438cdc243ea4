//! Geometry helpers for page-space rectangles.
//!
//! Converts the transforms carried by content streams (current
//! transformation matrix, text matrix, form matrices) into axis-aligned
//! page-space rectangles for cover-mark rendering.

/// Point in user space.
pub type Point = (f64, f64);

/// Transformation matrix (a, b, c, d, e, f).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

/// An axis-aligned rectangle in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rectangle from two opposite corners, normalizing so that
    /// width and height are non-negative.
    pub fn from_corners(p0: Point, p1: Point) -> Self {
        let x0 = p0.0.min(p1.0);
        let y0 = p0.1.min(p1.1);
        let x1 = p0.0.max(p1.0);
        let y1 = p0.1.max(p1.1);
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Checks another rectangle for approximate equality, for tests and
    /// de-noising float arithmetic.
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.x - other.x).abs() < epsilon
            && (self.y - other.y).abs() < epsilon
            && (self.width - other.width).abs() < epsilon
            && (self.height - other.height).abs() < epsilon
    }
}

/// Multiplies two matrices: result = m1 * m0.
/// This applies m0 first, then m1.
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Matrix {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    (
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    )
}

/// Translates a matrix by (x, y) inside its own coordinate system.
pub fn translate_matrix(m: Matrix, v: Point) -> Matrix {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a, b, c, d, x * a + y * c + e, x * b + y * d + f)
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Applies a matrix to a rectangle given as (x0, y0, x1, y1) corners.
///
/// The result is not a rotated rectangle but the axis-aligned box that
/// tightly fits the transformed corners.
pub fn apply_matrix_bbox(m: Matrix, bbox: (f64, f64, f64, f64)) -> Rect {
    let (x0, y0, x1, y1) = bbox;
    let corners = [
        apply_matrix_pt(m, (x0, y0)),
        apply_matrix_pt(m, (x1, y0)),
        apply_matrix_pt(m, (x1, y1)),
        apply_matrix_pt(m, (x0, y1)),
    ];
    let mut min = corners[0];
    let mut max = corners[0];
    for &(x, y) in &corners[1..] {
        min.0 = min.0.min(x);
        min.1 = min.1.min(y);
        max.0 = max.0.max(x);
        max.1 = max.1.max(y);
    }
    Rect::from_corners(min, max)
}

/// Page-space bounds of an image drawn under the given transform.
///
/// Images occupy the unit square in their own space; the active transform
/// places and scales them on the page.
pub fn image_bounds(ctm: Matrix) -> Rect {
    apply_matrix_bbox(ctm, (0.0, 0.0, 1.0, 1.0))
}

/// Page-space bounds of a form XObject with the given declared bounding
/// box, drawn under the given transform (the form's own matrix already
/// composed into it).
pub fn form_bounds(bbox: (f64, f64, f64, f64), ctm: Matrix) -> Rect {
    apply_matrix_bbox(ctm, bbox)
}
