//! Biome classification
//!
//! Maps per-cell (height, moisture, temperature) triples in `[0, 1]` to a small set of
//! terrain categories. Water is never produced here; it is decided upstream from the
//! ocean field before any climate noise is sampled.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};
use crate::tilemap::Tilemap;

/// Terrain category of a single cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BiomeType {
    #[default]
    Water = 0,
    Desert = 1,
    Grassland = 2,
    Forest = 3,
    Tundra = 4,
}

impl BiomeType {
    pub const ALL: [BiomeType; 5] = [
        BiomeType::Water,
        BiomeType::Desert,
        BiomeType::Grassland,
        BiomeType::Forest,
        BiomeType::Tundra,
    ];

    /// Classify a land cell.
    ///
    /// The mid band checks temperature before the dry/warm desert test, so some
    /// combinations that would be desert in the low band fall through to grassland here.
    pub fn classify(height: f32, moisture: f32, temperature: f32) -> BiomeType {
        if height < 0.3 {
            if moisture < 0.4 && temperature > 0.4 {
                BiomeType::Desert
            } else if temperature < 0.2 {
                BiomeType::Tundra
            } else {
                BiomeType::Grassland
            }
        } else if height < 0.6 {
            if moisture < 0.6 {
                if temperature < 0.2 {
                    BiomeType::Tundra
                } else if temperature > 0.4 && moisture < 0.4 {
                    BiomeType::Desert
                } else {
                    BiomeType::Grassland
                }
            } else {
                BiomeType::Forest
            }
        } else if temperature < 0.6 {
            BiomeType::Tundra
        } else {
            BiomeType::Forest
        }
    }

    pub fn is_water(&self) -> bool {
        matches!(self, BiomeType::Water)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BiomeType::Water => "Water",
            BiomeType::Desert => "Desert",
            BiomeType::Grassland => "Grassland",
            BiomeType::Forest => "Forest",
            BiomeType::Tundra => "Tundra",
        }
    }
}

/// Classify every cell of three equally-sized fields.
///
/// Fails with [`TerrainError::DimensionMismatch`] before writing anything if the
/// fields disagree in size.
pub fn classify_region(
    height: &Tilemap<f32>,
    moisture: &Tilemap<f32>,
    temperature: &Tilemap<f32>,
) -> Result<Tilemap<BiomeType>> {
    if !height.same_size(moisture) || !height.same_size(temperature) {
        return Err(TerrainError::DimensionMismatch {
            height: height.dimensions(),
            moisture: moisture.dimensions(),
            temperature: temperature.dimensions(),
        });
    }

    let cells = height
        .values()
        .iter()
        .zip(moisture.values())
        .zip(temperature.values())
        .map(|((&h, &m), &t)| BiomeType::classify(h, m, t))
        .collect();

    // Lengths were checked above.
    Tilemap::from_vec(height.width, height.height, cells).ok_or(TerrainError::DimensionMismatch {
        height: height.dimensions(),
        moisture: moisture.dimensions(),
        temperature: temperature.dimensions(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_dry_warm_is_desert() {
        assert_eq!(BiomeType::classify(0.2, 0.3, 0.5), BiomeType::Desert);
    }

    #[test]
    fn test_low_band() {
        assert_eq!(BiomeType::classify(0.1, 0.8, 0.1), BiomeType::Tundra);
        assert_eq!(BiomeType::classify(0.1, 0.8, 0.5), BiomeType::Grassland);
        // Dry but cold: desert test fails on temperature, tundra wins.
        assert_eq!(BiomeType::classify(0.1, 0.2, 0.1), BiomeType::Tundra);
    }

    #[test]
    fn test_mid_band() {
        assert_eq!(BiomeType::classify(0.4, 0.3, 0.1), BiomeType::Tundra);
        assert_eq!(BiomeType::classify(0.4, 0.3, 0.5), BiomeType::Desert);
        assert_eq!(BiomeType::classify(0.4, 0.5, 0.5), BiomeType::Grassland);
        assert_eq!(BiomeType::classify(0.4, 0.6, 0.0), BiomeType::Forest);
        // Cool but not cold: neither tundra nor desert.
        assert_eq!(BiomeType::classify(0.4, 0.3, 0.3), BiomeType::Grassland);
    }

    #[test]
    fn test_high_band() {
        assert_eq!(BiomeType::classify(0.6, 0.0, 0.59), BiomeType::Tundra);
        assert_eq!(BiomeType::classify(0.9, 1.0, 0.6), BiomeType::Forest);
    }

    #[test]
    fn test_classifier_is_total_and_never_water() {
        let steps = 41;
        for hi in 0..steps {
            for mi in 0..steps {
                for ti in 0..steps {
                    let h = hi as f32 / (steps - 1) as f32;
                    let m = mi as f32 / (steps - 1) as f32;
                    let t = ti as f32 / (steps - 1) as f32;
                    let biome = BiomeType::classify(h, m, t);
                    assert!(!biome.is_water(), "water at ({}, {}, {})", h, m, t);
                }
            }
        }
    }

    #[test]
    fn test_classify_region_matches_cellwise() {
        let height = Tilemap::from_vec(2, 1, vec![0.2f32, 0.9]).unwrap();
        let moisture = Tilemap::from_vec(2, 1, vec![0.3f32, 0.5]).unwrap();
        let temperature = Tilemap::from_vec(2, 1, vec![0.5f32, 0.9]).unwrap();
        let biomes = classify_region(&height, &moisture, &temperature).unwrap();
        assert_eq!(biomes.values(), &[BiomeType::Desert, BiomeType::Forest]);
    }

    #[test]
    fn test_classify_region_rejects_mismatched_sizes() {
        let height = Tilemap::new_with(4, 4, 0.5f32);
        let moisture = Tilemap::new_with(4, 4, 0.5f32);
        let temperature = Tilemap::new_with(4, 3, 0.5f32);
        match classify_region(&height, &moisture, &temperature) {
            Err(TerrainError::DimensionMismatch { temperature, .. }) => assert_eq!(temperature, (4, 3)),
            other => panic!("expected dimension mismatch, got {:?}", other.map(|m| m.dimensions())),
        }
    }
}
