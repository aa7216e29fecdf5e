//! Small 2D geometry helpers shared by the contour and triangulation stages.

use serde::Serialize;

/// Tolerance used for coordinate comparisons after smoothing. Contour
/// coordinates start on a half-cell lattice and only ever move by weighted
/// averages, so anything closer than this is the same coordinate.
pub const COORD_EPS: f32 = 1e-5;

/// A 2D point in cell space. Contour points sit on half-cell offsets
/// ((x - 0.5, y - 0.5) for a walked cell) so that geometry lines up with
/// cell boundaries rather than cell centers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point2 {
    type Output = Point2;
    fn add(self, rhs: Point2) -> Point2 {
        Point2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point2 {
    type Output = Point2;
    fn sub(self, rhs: Point2) -> Point2 {
        Point2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Point2 {
    type Output = Point2;
    fn mul(self, s: f32) -> Point2 {
        Point2::new(self.x * s, self.y * s)
    }
}

/// Approximate scalar equality on the contour coordinate scale.
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() <= COORD_EPS
}

/// Signed area of a closed polygon (shoelace formula). Positive for one
/// winding, negative for the other; callers that only care about coverage
/// take the absolute value.
pub fn signed_area(points: &[Point2]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Area of the triangle (a, b, c).
pub fn triangle_area(a: Point2, b: Point2, c: Point2) -> f32 {
    let ab = b - a;
    let ac = c - a;
    (ab.x * ac.y - ac.x * ab.y).abs() * 0.5
}
