//! Debug exports: render the cell grid to a PNG and dump chunk geometry to
//! JSON. Tooling only — the core pipeline never reads these back.

use image::{Rgb, RgbImage};
use serde::Serialize;

use crate::chunk::{ChunkId, Triangulation};
use crate::grid::{CellGrid, EMPTY};
use crate::terrain::Terrain;

/// Color for a material id. Empty ground is near-black; the stock two
/// materials get recognizable colors and anything beyond cycles a small
/// hash palette.
pub fn material_color(material: i32) -> Rgb<u8> {
    match material {
        EMPTY => Rgb([18, 18, 24]),
        1 => Rgb([96, 62, 35]),  // base earth
        2 => Rgb([76, 140, 58]), // overgrowth
        3 => Rgb([140, 140, 150]),
        4 => Rgb([180, 150, 80]),
        m => {
            let t = (m as u32).wrapping_mul(2654435761) >> 8;
            Rgb([
                (t & 0xff) as u8,
                ((t >> 8) & 0xff) as u8,
                ((t >> 16) & 0xff) as u8,
            ])
        }
    }
}

/// Render the material layer, one pixel per cell.
pub fn grid_to_image(grid: &CellGrid) -> RgbImage {
    let mut img = RgbImage::new(grid.width() as u32, grid.height() as u32);
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            img.put_pixel(x as u32, y as u32, material_color(grid.material(x, y)));
        }
    }
    img
}

/// Render the material layer with owned boundary cells brightened, which
/// makes chunk edges visible at a glance.
pub fn grid_to_image_with_ownership(grid: &CellGrid) -> RgbImage {
    let mut img = grid_to_image(grid);
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let owner = grid.owner(x, y);
            if owner.is_none() {
                continue;
            }
            let on_edge = [(1, 0), (-1, 0), (0, 1), (0, -1)]
                .iter()
                .any(|(dx, dy)| grid.owner(x + dx, y + dy) != owner);
            if on_edge {
                let Rgb([r, g, b]) = *img.get_pixel(x as u32, y as u32);
                img.put_pixel(
                    x as u32,
                    y as u32,
                    Rgb([
                        r.saturating_add(70),
                        g.saturating_add(70),
                        b.saturating_add(70),
                    ]),
                );
            }
        }
    }
    img
}

#[derive(Serialize)]
struct ContourExport {
    points: Vec<[f32; 2]>,
}

#[derive(Serialize)]
struct TriangulationExport {
    points: Vec<[f32; 2]>,
    indices: Vec<usize>,
}

#[derive(Serialize)]
struct ChunkExport {
    id: ChunkId,
    material: i32,
    outer: ContourExport,
    holes: Vec<ContourExport>,
    triangulation: Option<TriangulationExport>,
}

#[derive(Serialize)]
struct TerrainExport {
    width: i32,
    height: i32,
    stage: String,
    chunks: Vec<ChunkExport>,
}

fn contour_export(contour: &crate::contour::Contour) -> ContourExport {
    ContourExport {
        points: contour.iter().map(|p| [p.x, p.y]).collect(),
    }
}

fn triangulation_export(tri: &Triangulation) -> TriangulationExport {
    TriangulationExport {
        points: tri.points.iter().map(|p| [p.x, p.y]).collect(),
        indices: tri.indices.clone(),
    }
}

/// Serialize the terrain's chunk geometry to pretty-printed JSON.
pub fn terrain_to_json(terrain: &Terrain) -> serde_json::Result<String> {
    let mut chunks: Vec<ChunkExport> = terrain
        .chunks()
        .map(|chunk| ChunkExport {
            id: chunk.id,
            material: chunk.material,
            outer: contour_export(&chunk.outer),
            holes: chunk.holes.iter().map(contour_export).collect(),
            triangulation: chunk.triangulation.as_ref().map(triangulation_export),
        })
        .collect();
    chunks.sort_by_key(|c| c.id.0);

    let export = TerrainExport {
        width: terrain.grid().width(),
        height: terrain.grid().height(),
        stage: format!("{:?}", terrain.stage()),
        chunks,
    };
    serde_json::to_string_pretty(&export)
}
