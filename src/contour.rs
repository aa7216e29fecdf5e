//! Closed contour loops produced by the marching-squares tracer.
//!
//! A contour is an ordered, cyclic point sequence: indices wrap modulo the
//! length, and negative indices wrap backward. This makes the smoothing and
//! vertex-removal passes read naturally (`contour.get(i - 1)` at i = 0 is
//! the last point).

use crate::geometry::Point2;
use serde::Serialize;

#[derive(Clone, Debug, Default, Serialize)]
pub struct Contour {
    points: Vec<Point2>,
}

impl Contour {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: Vec<Point2>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Cyclic read. `get(-1)` is the last point, `get(len())` the first.
    /// Panics on an empty contour, same as any out-of-range slice access.
    pub fn get(&self, i: isize) -> Point2 {
        self.points[self.wrap(i)]
    }

    /// Cyclic write.
    pub fn set(&mut self, i: isize, p: Point2) {
        let idx = self.wrap(i);
        self.points[idx] = p;
    }

    pub fn push(&mut self, p: Point2) {
        self.points.push(p);
    }

    /// Remove the point at a (non-negative, in-range) index.
    pub fn remove(&mut self, i: usize) -> Point2 {
        self.points.remove(i)
    }

    /// Replace this contour's points wholesale. Used by smoothing, which
    /// must compute a full pass into a fresh buffer before overwriting.
    pub fn replace(&mut self, points: Vec<Point2>) {
        self.points = points;
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point2> {
        self.points.iter()
    }

    fn wrap(&self, i: isize) -> usize {
        let n = self.points.len() as isize;
        (((i % n) + n) % n) as usize
    }
}
