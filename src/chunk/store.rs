//! Concurrent chunk map.
//!
//! Workers insert freshly sliced chunks while the streaming thread reads and toggles
//! visibility. Entries are insert-if-absent: the first writer for a coordinate wins and
//! the value is never replaced or removed.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{ChunkCoord, ChunkData, RegionCoord};

/// Snapshot of store occupancy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub chunks: usize,
    pub visible: usize,
}

/// Sharded map from chunk coordinate to chunk data
#[derive(Debug, Default)]
pub struct ChunkStore {
    chunks: DashMap<ChunkCoord, Arc<ChunkData>>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self {
            chunks: DashMap::new(),
        }
    }

    /// Insert a chunk unless the coordinate is already stored.
    ///
    /// Returns `true` if this call stored the chunk.
    pub fn insert_if_absent(&self, coord: ChunkCoord, chunk: ChunkData) -> bool {
        match self.chunks.entry(coord) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(chunk));
                true
            }
        }
    }

    pub fn get(&self, coord: &ChunkCoord) -> Option<Arc<ChunkData>> {
        self.chunks.get(coord).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, coord: &ChunkCoord) -> bool {
        self.chunks.contains_key(coord)
    }

    /// Set visibility of a stored chunk. Returns `false` if the chunk is absent.
    pub fn set_visible(&self, coord: &ChunkCoord, visible: bool) -> bool {
        match self.chunks.get(coord) {
            Some(entry) => {
                entry.value().set_visible(visible);
                true
            }
            None => false,
        }
    }

    /// True when every chunk sliced from `region` is stored.
    pub fn region_complete(&self, region: RegionCoord, chunks_per_region: i32) -> bool {
        chunks_per_region > 0 && region.chunks(chunks_per_region).all(|c| self.contains(&c))
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Coordinates of every stored chunk, in no particular order.
    pub fn coords(&self) -> Vec<ChunkCoord> {
        self.chunks.iter().map(|entry| *entry.key()).collect()
    }

    /// Coordinates of chunks currently flagged visible.
    pub fn visible_coords(&self) -> Vec<ChunkCoord> {
        self.chunks
            .iter()
            .filter(|entry| entry.value().is_visible())
            .map(|entry| *entry.key())
            .collect()
    }

    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats::default();
        for entry in self.chunks.iter() {
            stats.chunks += 1;
            if entry.value().is_visible() {
                stats.visible += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::BiomeType;
    use crate::tilemap::Tilemap;
    use std::thread;

    #[test]
    fn test_first_insert_wins() {
        let store = ChunkStore::new();
        let coord = ChunkCoord::new(1, -2);
        assert!(store.insert_if_absent(coord, ChunkData::water(4, false)));

        let forest = ChunkData::new(Tilemap::new_with(4, 4, BiomeType::Forest), true);
        assert!(!store.insert_if_absent(coord, forest));

        let stored = store.get(&coord).unwrap();
        assert!(stored.is_all_water());
        assert!(!stored.is_visible());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_inserts_single_winner() {
        let store = Arc::new(ChunkStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut won = 0;
                    for n in 0..100 {
                        let chunk = ChunkData::water(2, i % 2 == 0);
                        if store.insert_if_absent(ChunkCoord::new(n, 0), chunk) {
                            won += 1;
                        }
                    }
                    won
                })
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 100);
        assert_eq!(store.len(), 100);
    }

    #[test]
    fn test_visibility_and_stats() {
        let store = ChunkStore::new();
        store.insert_if_absent(ChunkCoord::new(0, 0), ChunkData::water(2, false));
        store.insert_if_absent(ChunkCoord::new(0, 1), ChunkData::water(2, false));

        assert!(store.set_visible(&ChunkCoord::new(0, 1), true));
        assert!(!store.set_visible(&ChunkCoord::new(5, 5), true));
        assert_eq!(store.visible_coords(), vec![ChunkCoord::new(0, 1)]);
        assert_eq!(store.stats(), StoreStats { chunks: 2, visible: 1 });
    }

    #[test]
    fn test_region_complete() {
        let store = ChunkStore::new();
        let region = RegionCoord::new(-1, 0);
        for chunk in region.chunks(2).take(3) {
            store.insert_if_absent(chunk, ChunkData::water(50, false));
        }
        assert!(!store.region_complete(region, 2));
        store.insert_if_absent(region.chunk(1, 1, 2), ChunkData::water(50, false));
        assert!(store.region_complete(region, 2));
    }
}
