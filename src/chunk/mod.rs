//! Chunked terrain storage.
//!
//! Noise is generated one region (100×100 cells) at a time and sliced into square
//! chunks, which are the unit of storage and streaming. Chunks are never regenerated or
//! dropped once stored; the streaming controller only flips their visibility.

pub mod coords;
pub mod store;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::biomes::BiomeType;
use crate::tilemap::Tilemap;

pub use coords::{chunks_per_region, ChunkCoord, RegionCoord};
pub use store::{ChunkStore, StoreStats};

/// Edge length in cells of one generated region
pub const REGION_SIZE: usize = 100;

/// Terrain of one chunk plus its visibility flag.
///
/// The biome grid is immutable after construction. `is_visible` is written by the single
/// streaming thread and read from anywhere, hence the atomic.
#[derive(Debug)]
pub struct ChunkData {
    biomes: Tilemap<BiomeType>,
    is_visible: AtomicBool,
}

impl ChunkData {
    pub fn new(biomes: Tilemap<BiomeType>, visible: bool) -> Self {
        Self {
            biomes,
            is_visible: AtomicBool::new(visible),
        }
    }

    /// A chunk of nothing but water.
    pub fn water(chunk_size: usize, visible: bool) -> Self {
        Self::new(Tilemap::new_with(chunk_size, chunk_size, BiomeType::Water), visible)
    }

    pub fn biomes(&self) -> &Tilemap<BiomeType> {
        &self.biomes
    }

    pub fn biome(&self, x: usize, y: usize) -> BiomeType {
        *self.biomes.get(x, y)
    }

    pub fn size(&self) -> usize {
        self.biomes.width
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible.load(Ordering::Acquire)
    }

    pub fn set_visible(&self, visible: bool) {
        self.is_visible.store(visible, Ordering::Release);
    }

    pub fn is_all_water(&self) -> bool {
        self.biomes.values().iter().all(BiomeType::is_water)
    }

    /// Cell counts per biome, indexed by `BiomeType as usize`.
    pub fn biome_histogram(&self) -> [usize; 5] {
        let mut counts = [0usize; 5];
        for biome in self.biomes.values() {
            counts[*biome as usize] += 1;
        }
        counts
    }
}
