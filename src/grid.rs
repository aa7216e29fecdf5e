//! The cell grid: a fixed-size 2D array of material values plus a parallel
//! chunk-ownership map, stored as two flat arrays.
//!
//! Bounds handling is deliberately forgiving: out-of-range reads return the
//! `NO_MATERIAL` sentinel (-1, which never compares equal to empty or to any
//! material), and out-of-range writes are no-ops. The marching-squares
//! tracer leans on this so its neighbor probes never need explicit guards.

use crate::chunk::ChunkId;

/// Sentinel returned for reads outside the grid. Distinct from `EMPTY` so a
/// boundary probe never mistakes "off the map" for "no material here".
pub const NO_MATERIAL: i32 = -1;

/// An unpainted cell.
pub const EMPTY: i32 = 0;

/// An axis-aligned cell rectangle, used to bound cleanup passes and the
/// selective-rebuild invalidation region. May extend past the grid; the
/// grid's clamped accessors make that harmless, and `clamped` tightens it
/// when an exact cell set is needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Clamp this rectangle to the grid bounds.
    pub fn clamped(&self, grid: &CellGrid) -> Rect {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.w).min(grid.width());
        let y1 = (self.y + self.h).min(grid.height());
        Rect::new(x0, y0, (x1 - x0).max(0), (y1 - y0).max(0))
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

#[derive(Clone, Debug)]
pub struct CellGrid {
    width: i32,
    height: i32,
    material: Vec<i32>,
    owner: Vec<ChunkId>,
}

impl CellGrid {
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        let cells = (width * height) as usize;
        Self {
            width,
            height,
            material: vec![EMPTY; cells],
            owner: vec![ChunkId::NONE; cells],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Full-grid rectangle.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn idx(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Material at (x, y), or `NO_MATERIAL` outside the grid.
    pub fn material(&self, x: i32, y: i32) -> i32 {
        if !self.in_bounds(x, y) {
            return NO_MATERIAL;
        }
        self.material[self.idx(x, y)]
    }

    /// Write a material value. No-op outside the grid.
    pub fn set_material(&mut self, x: i32, y: i32, value: i32) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = self.idx(x, y);
        self.material[idx] = value;
    }

    /// Owning chunk of (x, y), or `ChunkId::NONE` outside the grid.
    pub fn owner(&self, x: i32, y: i32) -> ChunkId {
        if !self.in_bounds(x, y) {
            return ChunkId::NONE;
        }
        self.owner[self.idx(x, y)]
    }

    pub fn set_owner(&mut self, x: i32, y: i32, id: ChunkId) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = self.idx(x, y);
        self.owner[idx] = id;
    }

    /// Clear every cell's owner, ahead of a full re-trace.
    pub fn reset_ownership(&mut self) {
        self.owner.fill(ChunkId::NONE);
    }

    /// Clear ownership for every cell owned by a chunk in `ids`, anywhere
    /// on the grid. A destroyed chunk's cells can lie well outside the
    /// region that triggered its destruction, so this is a full scan.
    pub fn clear_owners_of(&mut self, ids: &std::collections::HashSet<ChunkId>) {
        for owner in self.owner.iter_mut() {
            if ids.contains(owner) {
                *owner = ChunkId::NONE;
            }
        }
    }

    /// Stamp the inclusive square [x, x+size] x [y, y+size] with a
    /// material. Returns whether any cell actually changed, so a repeated
    /// edit over identical ground reads as a no-op.
    pub fn fill_square(&mut self, x: i32, y: i32, size: i32, material: i32) -> bool {
        let mut changed = false;
        for i in 0..=size {
            for j in 0..=size {
                let xx = x + i;
                let yy = y + j;
                if !self.in_bounds(xx, yy) {
                    continue;
                }
                if self.material(xx, yy) == material {
                    continue;
                }
                self.set_material(xx, yy, material);
                changed = true;
            }
        }
        changed
    }

    /// Stamp a filled disc of the given radius. The outermost 1-cell border
    /// of the grid is never painted, which keeps every traced contour fully
    /// inside the grid. Returns whether any cell changed.
    pub fn fill_disc(&mut self, cx: i32, cy: i32, radius: i32, material: i32) -> bool {
        let mut changed = false;
        let r_sq = radius * radius;
        for i in -radius..radius {
            for j in -radius..radius {
                let xx = cx + i;
                let yy = cy + j;
                if xx < 1 || xx >= self.width - 1 {
                    continue;
                }
                if yy < 1 || yy >= self.height - 1 {
                    continue;
                }
                if i * i + j * j > r_sq {
                    continue;
                }
                if self.material(xx, yy) == material {
                    continue;
                }
                self.set_material(xx, yy, material);
                changed = true;
            }
        }
        changed
    }

    /// Count of cells holding the given material.
    pub fn count_material(&self, material: i32) -> usize {
        self.material.iter().filter(|&&m| m == material).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_reads_are_sentinel() {
        let grid = CellGrid::new(4, 4);
        assert_eq!(grid.material(-1, 0), NO_MATERIAL);
        assert_eq!(grid.material(0, 4), NO_MATERIAL);
        assert_eq!(grid.material(0, 0), EMPTY);
        assert_eq!(grid.owner(-1, -1), ChunkId::NONE);
    }

    #[test]
    fn test_out_of_range_writes_are_noops() {
        let mut grid = CellGrid::new(4, 4);
        grid.set_material(-1, 2, 7);
        grid.set_material(4, 0, 7);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(grid.material(x, y), EMPTY);
            }
        }
    }

    #[test]
    fn test_fill_square_is_inclusive_and_reports_change() {
        let mut grid = CellGrid::new(10, 10);
        assert!(grid.fill_square(2, 2, 4, 1));
        // Inclusive extent: 5x5 cells from (2,2) to (6,6).
        assert_eq!(grid.count_material(1), 25);
        assert_eq!(grid.material(6, 6), 1);
        assert_eq!(grid.material(7, 6), EMPTY);
        // Same fill again changes nothing.
        assert!(!grid.fill_square(2, 2, 4, 1));
    }

    #[test]
    fn test_fill_disc_skips_border() {
        let mut grid = CellGrid::new(10, 10);
        assert!(grid.fill_disc(0, 5, 4, 1));
        for y in 0..10 {
            assert_eq!(grid.material(0, y), EMPTY);
            assert_eq!(grid.material(9, y), EMPTY);
        }
        for x in 0..10 {
            assert_eq!(grid.material(x, 0), EMPTY);
            assert_eq!(grid.material(x, 9), EMPTY);
        }
        assert_eq!(grid.material(1, 5), 1);
    }

    #[test]
    fn test_clear_owners_of_is_full_grid() {
        let mut grid = CellGrid::new(6, 6);
        grid.set_owner(0, 0, ChunkId(3));
        grid.set_owner(5, 5, ChunkId(3));
        grid.set_owner(2, 2, ChunkId(4));
        let gone: std::collections::HashSet<ChunkId> = [ChunkId(3)].into_iter().collect();
        grid.clear_owners_of(&gone);
        assert_eq!(grid.owner(0, 0), ChunkId::NONE);
        assert_eq!(grid.owner(5, 5), ChunkId::NONE);
        assert_eq!(grid.owner(2, 2), ChunkId(4));
    }

    #[test]
    fn test_rect_clamped() {
        let grid = CellGrid::new(10, 10);
        let r = Rect::new(-2, 8, 6, 6).clamped(&grid);
        assert_eq!(r, Rect::new(0, 8, 4, 2));
    }
}
