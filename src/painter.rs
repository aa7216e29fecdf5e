//! Procedural cell painting.
//!
//! Each material is painted as a handful of blobs: a jittered random walk
//! of disc stamps, giving organic blotchy regions. Materials are painted in
//! priority order, so later materials overwrite earlier ones where the
//! walks overlap. After painting, two cleanup passes make the grid
//! traceable: isolated single cells are absorbed into their surroundings,
//! and pixel-thin diagonal pairs (which marching squares cannot represent
//! as a closed boundary) are straightened into edges.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::grid::{CellGrid, Rect};

/// How one material gets painted. Materials take their id from their
/// position in the spec list (first spec paints material 1, and so on).
#[derive(Clone, Copy, Debug)]
pub struct MaterialSpec {
    /// Number of separate blobs to seed across the grid.
    pub blobs: i32,
    /// Disc stamps per blob.
    pub passes: i32,
    /// Maximum per-pass jitter of the stamp center, in cells.
    pub drift: i32,
    /// Disc radius, in cells.
    pub radius: i32,
}

impl MaterialSpec {
    /// The stock two-material table: a broad base layer and a smaller,
    /// tighter accent layer painted over it.
    pub fn default_set() -> Vec<MaterialSpec> {
        vec![
            MaterialSpec {
                blobs: 2,
                passes: 256,
                drift: 20,
                radius: 10,
            },
            MaterialSpec {
                blobs: 2,
                passes: 128,
                drift: 10,
                radius: 5,
            },
        ]
    }
}

/// Paint every material spec into the grid. Blob starting points are
/// spread evenly across the width; each blob then walks randomly, with a
/// downward bias that weakens for later (higher-priority) materials so they
/// sit nearer the top of earlier layers.
pub fn paint(grid: &mut CellGrid, specs: &[MaterialSpec], rng: &mut ChaCha8Rng) {
    let width = grid.width();
    let height = grid.height();

    for (i, spec) in specs.iter().enumerate() {
        let material = i as i32 + 1;
        let band = i as i32 * (height / 2);

        for blob in 0..spec.blobs {
            let mut x = (blob + 1) * (width / (spec.blobs + 1));
            let mut y = rng.gen_range(0..(height / 3).max(1)) + band;

            for _ in 0..spec.passes {
                let drift = spec.drift.max(1);
                x += rng.gen_range(-drift..drift);
                y += rng.gen_range(-(drift / 2)..(drift / (i as i32 + 1)).max(1));
                grid.fill_disc(x, y, spec.radius, material);
            }
        }
    }
}

/// Isolated-cell removal over a sub-rectangle. A cell with no matching
/// value among its 8 neighbors is replaced by its left neighbor's value.
/// The scan runs column by column, top to bottom, and reads the grid as it
/// mutates: a cell's value may already reflect an earlier fix in the same
/// pass, which is what lets runs of isolated cells collapse in one sweep.
pub fn remove_isolated(grid: &mut CellGrid, region: Rect) {
    for x in region.x..region.x + region.w {
        for y in region.y..region.y + region.h {
            let v = grid.material(x, y);
            if v == crate::grid::NO_MATERIAL {
                continue;
            }
            // The sentinel read makes off-grid neighbors compare unequal,
            // so no explicit edge guards are needed here.
            if v == grid.material(x - 1, y)
                || v == grid.material(x + 1, y)
                || v == grid.material(x, y - 1)
                || v == grid.material(x, y + 1)
                || v == grid.material(x - 1, y - 1)
                || v == grid.material(x + 1, y - 1)
                || v == grid.material(x - 1, y + 1)
                || v == grid.material(x + 1, y + 1)
            {
                continue;
            }
            if x > 0 {
                grid.set_material(x, y, grid.material(x - 1, y));
            }
        }
    }
}

/// Diagonal-pair removal over a sub-rectangle. When one diagonal of a 2x2
/// block shares a value different from both cells of the other diagonal,
/// the block is rewritten so the pattern becomes a straight edge.
/// Marching squares cannot close a contour across such a checkerboard
/// join, so these must not survive into the tracer.
pub fn remove_diagonals(grid: &mut CellGrid, region: Rect) {
    for x in region.x..region.x + region.w {
        for y in region.y..region.y + region.h {
            let v = grid.material(x, y);
            if v == crate::grid::NO_MATERIAL {
                continue;
            }
            if v == grid.material(x + 1, y + 1)
                && v != grid.material(x + 1, y)
                && v != grid.material(x, y + 1)
            {
                grid.set_material(x, y, grid.material(x + 1, y));
                grid.set_material(x + 1, y + 1, grid.material(x, y + 1));
            }
        }
    }
}
