//! Contour refinement: neighbor-weighted smoothing and collinear vertex
//! removal. Both passes mutate a chunk's contours in place and invalidate
//! any triangulation the chunk carried, since the geometry it was built
//! from no longer exists.

use crate::chunk::Chunk;
use crate::contour::Contour;
use crate::geometry::{approx_eq, Point2};

/// 1-2-1 kernel applied to each point and its immediate neighbors.
const SMOOTH_WEIGHTS: [f32; 3] = [1.0, 2.0, 1.0];

/// Smoothing passes applied per refinement step.
pub const SMOOTH_PASSES: usize = 5;

/// One smoothing pass: every point becomes the 1-2-1 weighted average of
/// its 3-point neighborhood. The whole pass is computed into a fresh buffer
/// before the contour is overwritten, so no point ever averages against an
/// already-smoothed neighbor from the same pass.
pub fn smooth_contour(contour: &mut Contour) {
    if contour.len() < 3 {
        return;
    }
    let weight_sum: f32 = SMOOTH_WEIGHTS.iter().sum();
    let mut smoothed = Vec::with_capacity(contour.len());
    for i in 0..contour.len() as isize {
        let mut x = 0.0;
        let mut y = 0.0;
        for (j, w) in SMOOTH_WEIGHTS.iter().enumerate() {
            let p = contour.get(i + j as isize - 1);
            x += p.x * w;
            y += p.y * w;
        }
        smoothed.push(Point2::new(x / weight_sum, y / weight_sum));
    }
    contour.replace(smoothed);
}

/// Remove collinear vertices: a point is dropped when it lies on the same
/// axis-aligned run as both its neighbors (same x as both, or same y as
/// both, within tolerance). After a removal the scan stays at the same
/// index so the new neighbor triple is re-examined immediately.
pub fn simplify_contour(contour: &mut Contour) {
    let mut i = 0usize;
    while contour.len() >= 3 && i < contour.len() {
        let a = contour.get(i as isize - 1);
        let b = contour.get(i as isize);
        let c = contour.get(i as isize + 1);

        let run_x = approx_eq(a.x, b.x) && approx_eq(b.x, c.x);
        let run_y = approx_eq(a.y, b.y) && approx_eq(b.y, c.y);
        if run_x || run_y {
            contour.remove(i);
        } else {
            i += 1;
        }
    }
}

/// Smooth a chunk's outer contour and every hole, `SMOOTH_PASSES` times.
pub fn smooth_chunk(chunk: &mut Chunk) {
    chunk.triangulation = None;
    for _ in 0..SMOOTH_PASSES {
        smooth_contour(&mut chunk.outer);
    }
    for hole in chunk.holes.iter_mut() {
        for _ in 0..SMOOTH_PASSES {
            smooth_contour(hole);
        }
    }
}

/// Simplify a chunk's outer contour and every hole.
pub fn simplify_chunk(chunk: &mut Chunk) {
    chunk.triangulation = None;
    simplify_contour(&mut chunk.outer);
    for hole in chunk.holes.iter_mut() {
        simplify_contour(hole);
    }
}
