//! The terrain aggregate: cell grid + chunk registry + pipeline stage.
//!
//! A `Terrain` exclusively owns its grid and chunks; all mutation flows
//! through `&mut self`, which is the entire single-writer story (no
//! internal locking). Full-pipeline operations advance the `Stage` marker
//! monotonically; `edit_region` is the sole mutation entry point once
//! generation has started, and re-runs only the stages and region an edit
//! actually affects.

use std::collections::HashSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::chunk::{Chunk, ChunkId, ChunkRegistry};
use crate::decomp::{decompose_chunk, DecompError};
use crate::grid::{CellGrid, Rect};
use crate::marching::{march, TraceError};
use crate::painter::{self, MaterialSpec};
use crate::refine::{simplify_chunk, smooth_chunk};

/// Extra cells around an edit square that may hold affected chunks. Two is
/// enough to cover the cleanup passes' reach plus the half-cell contour
/// offset.
const INVALIDATION_BORDER: i32 = 2;

/// How far the whole terrain has progressed through the pipeline. Linear,
/// no branching, no rollback; the rebuild controller uses it to decide
/// which stages newly regenerated chunks must catch up on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    None,
    Dots,
    Marching,
    Smoothed,
    VertexReduced,
    Decomposed,
}

pub struct Terrain {
    grid: CellGrid,
    registry: ChunkRegistry,
    stage: Stage,
    specs: Vec<MaterialSpec>,
}

impl Terrain {
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_specs(width, height, MaterialSpec::default_set())
    }

    pub fn with_specs(width: i32, height: i32, specs: Vec<MaterialSpec>) -> Self {
        Self {
            grid: CellGrid::new(width, height),
            registry: ChunkRegistry::new(),
            stage: Stage::None,
            specs,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.registry.iter()
    }

    pub fn chunk(&self, id: ChunkId) -> Option<&Chunk> {
        self.registry.get(id)
    }

    pub fn chunk_count(&self) -> usize {
        self.registry.len()
    }

    /// Paint a fresh terrain with a seed drawn from the process RNG. Two
    /// runs of the same program therefore differ; use
    /// [`generate_with_seed`](Self::generate_with_seed) to reproduce one.
    pub fn generate(&mut self) -> u64 {
        let seed: u64 = rand::random();
        self.generate_with_seed(seed);
        seed
    }

    /// Deterministically paint a fresh terrain: blob painting followed by
    /// both cleanup passes over the full grid. Discards any existing
    /// chunks. Leaves the terrain at `Stage::Dots`.
    pub fn generate_with_seed(&mut self, seed: u64) {
        self.grid = CellGrid::new(self.grid.width(), self.grid.height());
        self.registry.clear();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        painter::paint(&mut self.grid, &self.specs, &mut rng);
        let bounds = self.grid.bounds();
        painter::remove_isolated(&mut self.grid, bounds);
        painter::remove_diagonals(&mut self.grid, bounds);

        self.stage = Stage::Dots;
    }

    /// Trace the full grid into chunks. Clears all previous ownership and
    /// chunk records first (ids are not reused). Leaves the terrain at
    /// `Stage::Marching`.
    pub fn march(&mut self) -> Result<(), TraceError> {
        self.grid.reset_ownership();
        self.registry.clear();
        let bounds = self.grid.bounds();
        march(&mut self.grid, &mut self.registry, bounds)?;
        self.stage = Stage::Marching;
        Ok(())
    }

    /// Smooth every chunk's contours. Leaves the terrain at
    /// `Stage::Smoothed`.
    pub fn smooth_contours(&mut self) {
        for chunk in self.registry.iter_mut() {
            smooth_chunk(chunk);
        }
        self.stage = Stage::Smoothed;
    }

    /// Drop collinear vertices from every chunk's contours. Leaves the
    /// terrain at `Stage::VertexReduced`.
    pub fn remove_vertices(&mut self) {
        for chunk in self.registry.iter_mut() {
            simplify_chunk(chunk);
        }
        self.stage = Stage::VertexReduced;
    }

    /// Triangulate every chunk. A failed chunk is logged, reported, and
    /// left without a triangulation; the rest of the terrain is unaffected.
    /// Leaves the terrain at `Stage::Decomposed`.
    pub fn decompose(&mut self) -> Vec<(ChunkId, DecompError)> {
        let mut failures = Vec::new();
        for chunk in self.registry.iter_mut() {
            if let Err(err) = decompose_chunk(chunk) {
                log::warn!("chunk {:?} failed to decompose: {}", chunk.id, err);
                failures.push((chunk.id, err));
            }
        }
        self.stage = Stage::Decomposed;
        failures
    }

    /// Stamp the square [x, x+size] x [y, y+size] with a material and
    /// repair the chunk structure around it. Returns `Ok(false)` when the
    /// paint changed nothing (a valid cancelled edit). Tracing failures
    /// abort the rebuild; decomposition failures are per-chunk and only
    /// logged.
    ///
    /// The repair is deliberately asymmetric: painting, chunk destruction
    /// and cleanup are scoped to the invalidation rectangle, but the
    /// re-trace covers the whole grid, because connectivity (and therefore
    /// chunk ownership) can only be established by a full scan. Untouched
    /// chunks keep their ids and geometry; only unowned cells grow new
    /// chunks, which then catch up to whatever stage the terrain had
    /// already reached.
    pub fn edit_region(
        &mut self,
        x: i32,
        y: i32,
        size: i32,
        material: i32,
    ) -> Result<bool, TraceError> {
        let changed = self.grid.fill_square(x, y, size, material);
        if !changed {
            return Ok(false);
        }
        if self.stage <= Stage::Dots {
            // No chunk structure exists yet to repair.
            return Ok(true);
        }

        let invalidation = Rect::new(
            x - INVALIDATION_BORDER,
            y - INVALIDATION_BORDER,
            size + 2 * INVALIDATION_BORDER,
            size + 2 * INVALIDATION_BORDER,
        )
        .clamped(&self.grid);

        // Destroy every chunk owning a cell in the invalidation rectangle,
        // then clear its ownership across the whole grid: a destroyed
        // chunk's cells can lie far outside the rectangle.
        let mut doomed: HashSet<ChunkId> = HashSet::new();
        for yy in invalidation.y..invalidation.y + invalidation.h {
            for xx in invalidation.x..invalidation.x + invalidation.w {
                let owner = self.grid.owner(xx, yy);
                if owner.is_some() {
                    doomed.insert(owner);
                }
            }
        }
        for id in &doomed {
            self.registry.remove(*id);
        }
        self.grid.clear_owners_of(&doomed);

        // Local cleanup, global re-trace.
        painter::remove_isolated(&mut self.grid, invalidation);
        painter::remove_diagonals(&mut self.grid, invalidation);
        let bounds = self.grid.bounds();
        let created = march(&mut self.grid, &mut self.registry, bounds)?;

        // New chunks catch up to the terrain's current stage; everything
        // that survived the edit is left exactly as it was.
        if self.stage >= Stage::Smoothed {
            for id in &created {
                if let Some(chunk) = self.registry.get_mut(*id) {
                    smooth_chunk(chunk);
                }
            }
        }
        if self.stage >= Stage::VertexReduced {
            for id in &created {
                if let Some(chunk) = self.registry.get_mut(*id) {
                    simplify_chunk(chunk);
                }
            }
        }
        if self.stage >= Stage::Decomposed {
            for id in &created {
                if let Some(chunk) = self.registry.get_mut(*id) {
                    if let Err(err) = decompose_chunk(chunk) {
                        log::warn!("rebuilt chunk {:?} failed to decompose: {}", id, err);
                    }
                }
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::triangle_area;

    #[test]
    fn test_stage_order() {
        assert!(Stage::None < Stage::Dots);
        assert!(Stage::Dots < Stage::Marching);
        assert!(Stage::Marching < Stage::Smoothed);
        assert!(Stage::Smoothed < Stage::VertexReduced);
        assert!(Stage::VertexReduced < Stage::Decomposed);
    }

    #[test]
    fn test_noop_edit_reports_false() {
        let mut t = Terrain::new(10, 10);
        t.march().unwrap();
        assert!(t.edit_region(2, 2, 4, 1).unwrap());
        // Painting the same square again changes nothing.
        assert!(!t.edit_region(2, 2, 4, 1).unwrap());
    }

    #[test]
    fn test_edit_before_marching_only_paints() {
        let mut t = Terrain::new(10, 10);
        assert_eq!(t.stage(), Stage::None);
        assert!(t.edit_region(2, 2, 4, 1).unwrap());
        assert_eq!(t.chunk_count(), 0, "no chunk structure exists yet");
        assert_eq!(t.grid().material(3, 3), 1);
    }

    #[test]
    fn test_edit_square_scenario() {
        // Empty 10x10 grid at Marching: a 4-sized edit creates exactly one
        // chunk, which simplifies to a 4-corner square and decomposes into
        // 2 triangles over 4 unique points.
        let mut t = Terrain::new(10, 10);
        t.march().unwrap();
        assert!(t.edit_region(2, 2, 4, 1).unwrap());
        assert_eq!(t.chunk_count(), 1);

        t.remove_vertices();
        let chunk = t.chunks().next().unwrap();
        assert_eq!(chunk.outer.len(), 4);
        assert!(chunk.holes.is_empty());

        let failures = t.decompose();
        assert!(failures.is_empty());
        let chunk = t.chunks().next().unwrap();
        let tri = chunk.triangulation.as_ref().unwrap();
        assert_eq!(tri.triangle_count(), 2);
        assert_eq!(tri.points.len(), 4);
        let area: f32 = tri
            .indices
            .chunks_exact(3)
            .map(|ix| triangle_area(tri.points[ix[0]], tri.points[ix[1]], tri.points[ix[2]]))
            .sum();
        // 5x5 painted cells trace to a 5x5 cell-space square.
        assert!((area - 25.0).abs() < 1e-3);
    }

    #[test]
    fn test_edit_containment() {
        let mut t = Terrain::new(24, 12);
        // Two well-separated squares.
        t.edit_region(2, 2, 4, 1).unwrap();
        t.edit_region(16, 2, 4, 1).unwrap();
        t.march().unwrap();
        assert_eq!(t.chunk_count(), 2);

        let left_id = t.grid().owner(3, 3);
        let right_id = t.grid().owner(17, 3);
        assert!(left_id.is_some() && right_id.is_some());

        // Edit inside the left square only.
        assert!(t.edit_region(3, 3, 1, 2).unwrap());
        assert_eq!(t.chunk_count(), 3, "left square splits material 1 around the patch or rebuilds");

        // The right chunk is outside the invalidation rectangle: same id,
        // same geometry.
        assert_eq!(t.grid().owner(17, 3), right_id);
        assert!(t.chunk(right_id).is_some());
        // The left chunk was destroyed and rebuilt under fresh ids.
        assert!(t.chunk(left_id).is_none());
        assert!(t.grid().owner(3, 3) != left_id);
    }

    #[test]
    fn test_rebuild_catches_new_chunks_up_to_stage() {
        let mut t = Terrain::new(16, 16);
        t.march().unwrap();
        t.edit_region(2, 2, 4, 1).unwrap();
        t.remove_vertices();
        let failures = t.decompose();
        assert!(failures.is_empty());
        assert_eq!(t.stage(), Stage::Decomposed);

        // A separate edit elsewhere must arrive already simplified and
        // triangulated, because the terrain is at Decomposed.
        t.edit_region(9, 9, 4, 2).unwrap();
        assert_eq!(t.chunk_count(), 2);
        for chunk in t.chunks() {
            assert!(
                chunk.triangulation.is_some(),
                "chunk {:?} should be triangulated",
                chunk.id
            );
        }
    }

    #[test]
    fn test_generate_is_deterministic_per_seed() {
        let mut a = Terrain::new(80, 60);
        let mut b = Terrain::new(80, 60);
        a.generate_with_seed(7);
        b.generate_with_seed(7);
        assert_eq!(a.stage(), Stage::Dots);
        for y in 0..60 {
            for x in 0..80 {
                assert_eq!(a.grid().material(x, y), b.grid().material(x, y));
            }
        }
    }

    #[test]
    fn test_ownership_consistency_invariant() {
        let mut t = Terrain::new(20, 20);
        t.edit_region(2, 2, 6, 1).unwrap();
        t.edit_region(11, 11, 5, 2).unwrap();
        t.march().unwrap();
        t.edit_region(5, 5, 3, 2).unwrap();

        for y in 0..20 {
            for x in 0..20 {
                let owner = t.grid().owner(x, y);
                if owner.is_some() {
                    let chunk = t.chunk(owner).expect("owner must be a live chunk");
                    assert_eq!(t.grid().material(x, y), chunk.material);
                }
            }
        }
    }
}
