//! Coordinate spaces for streamed terrain.
//!
//! Three levels, all signed so the map extends in every direction from the origin:
//!
//! | Space  | Unit                         | Type          |
//! |--------|------------------------------|---------------|
//! | World  | one terrain cell             | `(i64, i64)`  |
//! | Chunk  | `chunk_size × chunk_size`    | [`ChunkCoord`]  |
//! | Region | `REGION_SIZE × REGION_SIZE`  | [`RegionCoord`] |
//!
//! A region is sliced into `chunks_per_region²` chunks. When `chunk_size` does not
//! divide [`REGION_SIZE`], the trailing cells of each region belong to no chunk.

use serde::{Deserialize, Serialize};

use super::REGION_SIZE;

/// Position of a chunk in chunk space
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing a world-space position. Floors toward negative infinity.
    pub fn from_world(world_x: f32, world_y: f32, chunk_size: usize) -> Self {
        let size = chunk_size as f32;
        Self::new((world_x / size).floor() as i32, (world_y / size).floor() as i32)
    }

    /// Region this chunk is sliced from.
    pub fn region(&self, chunks_per_region: i32) -> RegionCoord {
        RegionCoord::new(
            self.x.div_euclid(chunks_per_region),
            self.y.div_euclid(chunks_per_region),
        )
    }

    /// World-space cell at the chunk's minimum corner.
    pub fn world_origin(&self, chunk_size: usize) -> (i64, i64) {
        (self.x as i64 * chunk_size as i64, self.y as i64 * chunk_size as i64)
    }
}

/// Position of a region in region space
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionCoord {
    pub x: i32,
    pub y: i32,
}

impl RegionCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell offset passed to the noise generator for this region.
    pub fn pixel_offset(&self) -> (i64, i64) {
        (self.x as i64 * REGION_SIZE as i64, self.y as i64 * REGION_SIZE as i64)
    }

    /// Chunk at local position `(local_x, local_y)` inside this region.
    pub fn chunk(&self, local_x: i32, local_y: i32, chunks_per_region: i32) -> ChunkCoord {
        ChunkCoord::new(
            self.x * chunks_per_region + local_x,
            self.y * chunks_per_region + local_y,
        )
    }

    /// Every chunk sliced from this region, row-major.
    pub fn chunks(&self, chunks_per_region: i32) -> impl Iterator<Item = ChunkCoord> + '_ {
        (0..chunks_per_region).flat_map(move |ly| {
            (0..chunks_per_region).map(move |lx| self.chunk(lx, ly, chunks_per_region))
        })
    }
}

/// Number of whole chunks along one region edge.
pub fn chunks_per_region(chunk_size: usize) -> i32 {
    if chunk_size == 0 {
        return 0;
    }
    (REGION_SIZE / chunk_size) as i32
}
