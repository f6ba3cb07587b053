//! Seed management for terrain generation
//!
//! Every noise layer gets its own seed, offset from the base seed so that layers stay
//! decorrelated while the whole world remains reproducible from one number.

use crate::chunk::ChunkCoord;

/// Seed for the layer at position `index` in the configured layer list.
pub fn layer_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add(index as u64)
}

/// Seeds for the three per-region climate fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionSeeds {
    /// Base seed (used for display/reference)
    pub base: u64,
    pub height: u64,
    pub moisture: u64,
    pub temperature: u64,
}

impl RegionSeeds {
    pub fn from_base(base: u64) -> Self {
        Self {
            base,
            height: layer_seed(base, 0),
            moisture: layer_seed(base, 1),
            temperature: layer_seed(base, 2),
        }
    }
}

impl std::fmt::Display for RegionSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RegionSeeds {{ base: {}, height: {}, moisture: {}, temperature: {} }}",
            self.base, self.height, self.moisture, self.temperature,
        )
    }
}

/// Deterministic seed for per-chunk randomness (structure placement).
///
/// splitmix64-style mixing of the world seed with both chunk coordinates.
pub fn chunk_seed(world_seed: u64, coord: ChunkCoord) -> u64 {
    let mut hash = world_seed.wrapping_add(0x7E61_0741);

    hash = hash.wrapping_add(coord.x as i64 as u64);
    hash ^= hash >> 30;
    hash = hash.wrapping_mul(0xbf58476d1ce4e5b9);

    hash = hash.wrapping_add(coord.y as i64 as u64);
    hash ^= hash >> 27;
    hash = hash.wrapping_mul(0x94d049bb133111eb);

    hash ^= hash >> 31;
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_seed_offsets() {
        let seeds = RegionSeeds::from_base(100);
        assert_eq!(seeds.height, 100);
        assert_eq!(seeds.moisture, 101);
        assert_eq!(seeds.temperature, 102);
    }

    #[test]
    fn test_layer_seed_wraps() {
        assert_eq!(layer_seed(u64::MAX, 1), 0);
    }

    #[test]
    fn test_chunk_seed_deterministic_and_distinct() {
        let a = chunk_seed(7, ChunkCoord::new(3, -4));
        assert_eq!(a, chunk_seed(7, ChunkCoord::new(3, -4)));
        assert_ne!(a, chunk_seed(7, ChunkCoord::new(-4, 3)));
        assert_ne!(a, chunk_seed(8, ChunkCoord::new(3, -4)));
    }
}
