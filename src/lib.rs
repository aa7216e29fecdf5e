//! 2D layered terrain generation
//!
//! Builds a layered 2D terrain from a grid of typed cells and keeps it
//! consistent under runtime edits: procedural painting, marching-squares
//! contour tracing, contour refinement, hole-aware triangulation, and a
//! selective rebuild that re-runs only what an edit touched.

pub mod chunk;
pub mod contour;
pub mod decomp;
pub mod export;
pub mod geometry;
pub mod grid;
pub mod marching;
pub mod painter;
pub mod refine;
pub mod terrain;

pub use chunk::{Chunk, ChunkId, ChunkRegistry, Triangulation};
pub use contour::Contour;
pub use geometry::Point2;
pub use grid::{CellGrid, Rect};
pub use terrain::{Stage, Terrain};
