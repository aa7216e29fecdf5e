//! Polygon decomposition: turn a chunk's outer contour plus holes into a
//! triangulated point/index buffer via earcut.
//!
//! The triangulator sees one flat coordinate list (outer loop first, then
//! each hole, with hole start offsets). Emitted triangles are re-indexed
//! against a deduplicated point list: a coordinate referenced by several
//! triangles maps to a single output index.

use std::collections::HashMap;
use std::fmt;

use crate::chunk::{Chunk, Triangulation};
use crate::contour::Contour;
use crate::geometry::{signed_area, Point2};

/// Decomposition failure for a single chunk. Fatal only for that chunk:
/// the caller logs it, leaves the chunk untriangulated, and carries on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecompError {
    /// The outer contour has too few points to bound any area.
    Degenerate { points: usize },
    /// The triangulator rejected the polygon (self-intersecting or
    /// otherwise malformed after aggressive simplification).
    Triangulation(String),
}

impl fmt::Display for DecompError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecompError::Degenerate { points } => {
                write!(f, "degenerate contour with {} points", points)
            }
            DecompError::Triangulation(msg) => write!(f, "triangulation failed: {}", msg),
        }
    }
}

impl std::error::Error for DecompError {}

fn push_loop(flat: &mut Vec<f64>, contour: &Contour, reverse: bool) {
    if reverse {
        for p in contour.points().iter().rev() {
            flat.push(p.x as f64);
            flat.push(p.y as f64);
        }
    } else {
        for p in contour.points() {
            flat.push(p.x as f64);
            flat.push(p.y as f64);
        }
    }
}

/// Triangulate the chunk and store the result on it. Replaces any previous
/// triangulation.
pub fn decompose_chunk(chunk: &mut Chunk) -> Result<(), DecompError> {
    if chunk.outer.len() < 3 {
        return Err(DecompError::Degenerate {
            points: chunk.outer.len(),
        });
    }

    // Earcut wants the outer loop and holes wound opposite ways; our walk
    // direction depends on where the scan first touched the region, so
    // normalize here instead of relying on it.
    let outer_cw = signed_area(chunk.outer.points()) > 0.0;
    let mut flat: Vec<f64> = Vec::new();
    push_loop(&mut flat, &chunk.outer, !outer_cw);

    let mut hole_starts: Vec<usize> = Vec::new();
    let mut offset = chunk.outer.len();
    for hole in &chunk.holes {
        if hole.len() < 3 {
            continue;
        }
        hole_starts.push(offset);
        offset += hole.len();
        let hole_cw = signed_area(hole.points()) > 0.0;
        push_loop(&mut flat, hole, hole_cw);
    }

    let indices = earcutr::earcut(&flat, &hole_starts, 2)
        .map_err(|e| DecompError::Triangulation(format!("{:?}", e)))?;
    if indices.is_empty() {
        return Err(DecompError::Triangulation(
            "no triangles produced".to_string(),
        ));
    }

    // Re-emit against a deduplicated point list, keyed on the exact
    // coordinate bit pattern.
    let mut points: Vec<Point2> = Vec::new();
    let mut final_indices: Vec<usize> = Vec::with_capacity(indices.len());
    let mut point_to_index: HashMap<(u32, u32), usize> = HashMap::new();
    for &idx in &indices {
        let x = flat[idx * 2] as f32;
        let y = flat[idx * 2 + 1] as f32;
        let key = (x.to_bits(), y.to_bits());
        let out = *point_to_index.entry(key).or_insert_with(|| {
            points.push(Point2::new(x, y));
            points.len() - 1
        });
        final_indices.push(out);
    }

    chunk.triangulation = Some(Triangulation {
        points,
        indices: final_indices,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkRegistry;
    use crate::geometry::triangle_area;

    fn square(x0: f32, y0: f32, x1: f32, y1: f32) -> Contour {
        Contour::from_points(vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ])
    }

    fn triangulated_area(tri: &Triangulation) -> f32 {
        tri.indices
            .chunks_exact(3)
            .map(|t| triangle_area(tri.points[t[0]], tri.points[t[1]], tri.points[t[2]]))
            .sum()
    }

    #[test]
    fn test_square_decomposes_to_two_triangles() {
        let mut reg = ChunkRegistry::new();
        let id = reg.create(1);
        let chunk = reg.get_mut(id).unwrap();
        chunk.outer = square(1.5, 1.5, 6.5, 6.5);

        decompose_chunk(chunk).unwrap();
        let tri = chunk.triangulation.as_ref().unwrap();
        assert_eq!(tri.triangle_count(), 2);
        assert_eq!(tri.points.len(), 4);
        assert!((triangulated_area(tri) - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_indices_reference_emitted_points() {
        let mut reg = ChunkRegistry::new();
        let id = reg.create(1);
        let chunk = reg.get_mut(id).unwrap();
        chunk.outer = square(0.0, 0.0, 8.0, 8.0);
        chunk.holes.push(square(2.0, 2.0, 6.0, 6.0));

        decompose_chunk(chunk).unwrap();
        let tri = chunk.triangulation.as_ref().unwrap();
        assert_eq!(tri.indices.len() % 3, 0);
        for &i in &tri.indices {
            assert!(i < tri.points.len());
        }
        // Every emitted point is distinct.
        let mut seen = std::collections::HashSet::new();
        for p in &tri.points {
            assert!(seen.insert((p.x.to_bits(), p.y.to_bits())));
        }
    }

    #[test]
    fn test_hole_area_is_subtracted() {
        let mut reg = ChunkRegistry::new();
        let id = reg.create(1);
        let chunk = reg.get_mut(id).unwrap();
        chunk.outer = square(0.0, 0.0, 8.0, 8.0);
        chunk.holes.push(square(2.0, 2.0, 6.0, 6.0));

        decompose_chunk(chunk).unwrap();
        let tri = chunk.triangulation.as_ref().unwrap();
        // 64 outer minus 16 hole.
        assert!((triangulated_area(tri) - 48.0).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_contour_is_an_error() {
        let mut reg = ChunkRegistry::new();
        let id = reg.create(1);
        let chunk = reg.get_mut(id).unwrap();
        chunk.outer = Contour::from_points(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert!(matches!(
            decompose_chunk(chunk),
            Err(DecompError::Degenerate { points: 2 })
        ));
        assert!(chunk.triangulation.is_none());
    }
}
