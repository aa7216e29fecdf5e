//! Chunk records and the id -> chunk registry.
//!
//! A chunk is one connected region of same-material cells: an outer contour
//! plus zero or more hole contours, and (once the pipeline reaches that
//! stage) a triangulation. Ids are allocated per registry, start at 1, and
//! are never reused; 0 is reserved as "no chunk" for the grid ownership map.

use std::collections::HashMap;

use crate::contour::Contour;
use crate::geometry::Point2;
use serde::Serialize;

/// Chunk identifier (0 = none).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ChunkId(pub u32);

impl ChunkId {
    pub const NONE: ChunkId = ChunkId(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    pub fn is_some(&self) -> bool {
        self.0 != 0
    }
}

/// Deduplicated triangulated geometry for one chunk: a point list and a
/// flat list of triangle index triples into it.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Triangulation {
    pub points: Vec<Point2>,
    pub indices: Vec<usize>,
}

impl Triangulation {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Clone, Debug)]
pub struct Chunk {
    pub id: ChunkId,
    /// Material id shared by every cell this chunk owns.
    pub material: i32,
    pub outer: Contour,
    pub holes: Vec<Contour>,
    /// Present only once the decomposition stage has run on this chunk and
    /// succeeded; smoothing or simplification clears it again.
    pub triangulation: Option<Triangulation>,
}

impl Chunk {
    fn new(id: ChunkId, material: i32) -> Self {
        Self {
            id,
            material,
            outer: Contour::new(),
            holes: Vec::new(),
            triangulation: None,
        }
    }
}

/// Owns every live chunk and allocates ids. The id counter is scoped to the
/// registry (one per terrain), so separate terrains never share id space.
#[derive(Debug, Default)]
pub struct ChunkRegistry {
    chunks: HashMap<ChunkId, Chunk>,
    next_id: u32,
}

impl ChunkRegistry {
    pub fn new() -> Self {
        Self {
            chunks: HashMap::new(),
            next_id: 0,
        }
    }

    /// Create an empty chunk for the given material and return its id.
    pub fn create(&mut self, material: i32) -> ChunkId {
        self.next_id += 1;
        let id = ChunkId(self.next_id);
        self.chunks.insert(id, Chunk::new(id, material));
        id
    }

    /// Drop a chunk record. The caller is responsible for clearing any grid
    /// ownership references to this id first.
    pub fn remove(&mut self, id: ChunkId) -> Option<Chunk> {
        self.chunks.remove(&id)
    }

    pub fn get(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.get(&id)
    }

    pub fn get_mut(&mut self, id: ChunkId) -> Option<&mut Chunk> {
        self.chunks.get_mut(&id)
    }

    pub fn contains(&self, id: ChunkId) -> bool {
        self.chunks.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.chunks.values_mut()
    }

    pub fn ids(&self) -> Vec<ChunkId> {
        self.chunks.keys().copied().collect()
    }

    /// Drop all chunks. The id counter keeps running so regenerated
    /// terrains never recycle ids.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}
