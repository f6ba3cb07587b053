//! Configuration for terrain generation.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chunk::REGION_SIZE;
use crate::error::{Result, TerrainError};
use crate::noise_field::NoiseSettings;
use crate::scheduler::{RegionLayers, SchedulerParams};
use crate::structures::PlacementParams;
use crate::streaming::MAX_VIEW_RADIUS;

pub const OCEAN_MAP: &str = "Ocean Map";
pub const RIVER_MAP: &str = "River Map";
pub const OCEAN_HEIGHT_MAP: &str = "Ocean Height Map";
pub const OCEAN_MOISTURE_MAP: &str = "Ocean Moisture Map";
pub const OCEAN_TEMPERATURE_MAP: &str = "Ocean Temperature Map";

/// Layers generated once for the whole map rather than per region.
pub const GLOBAL_LAYERS: [&str; 2] = [OCEAN_MAP, RIVER_MAP];

/// A named noise layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseLayer {
    pub name: String,
    #[serde(default)]
    pub settings: NoiseSettings,
}

impl NoiseLayer {
    pub fn new(name: &str, settings: NoiseSettings) -> Self {
        Self {
            name: name.to_string(),
            settings,
        }
    }
}

/// Configuration parameters for the terrain generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Width of the global layers, one sample per region (default: 100).
    pub map_width: usize,

    /// Height of the global layers, one sample per region (default: 100).
    pub map_height: usize,

    /// Chunk edge length in cells. Must be in `1..=100`.
    pub chunk_size: usize,

    /// Base seed; each layer adds its own offset.
    pub seed: u64,

    /// Noise layers in seed order.
    pub layers: Vec<NoiseLayer>,

    /// Regions within this radius of the origin are queued at startup.
    pub ocean_radius: i32,

    /// Region budget per generation pass.
    pub max_regions_per_tick: usize,

    /// Generation pool size; 0 uses one thread per core.
    pub worker_threads: usize,

    /// Mark every generated chunk visible on creation.
    pub view_full_map: bool,

    /// Streaming window radius in chunks.
    pub view_radius: i32,

    pub placement: PlacementParams,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            map_width: 100,
            map_height: 100,
            chunk_size: 16,
            seed: 0,
            layers: default_layers(),
            ocean_radius: 5,
            max_regions_per_tick: 8,
            worker_threads: 0,
            view_full_map: false,
            view_radius: 2,
            placement: PlacementParams::default(),
        }
    }
}

/// The three region climate layers first, then the global ocean and river maps.
fn default_layers() -> Vec<NoiseLayer> {
    vec![
        NoiseLayer::new(OCEAN_HEIGHT_MAP, NoiseSettings::default()),
        NoiseLayer::new(
            OCEAN_MOISTURE_MAP,
            NoiseSettings {
                octaves: 3,
                ..NoiseSettings::default()
            },
        ),
        NoiseLayer::new(
            OCEAN_TEMPERATURE_MAP,
            NoiseSettings {
                octaves: 2,
                persistence: 0.4,
                ..NoiseSettings::default()
            },
        ),
        NoiseLayer::new(
            OCEAN_MAP,
            NoiseSettings {
                scale: 2.0,
                ..NoiseSettings::default()
            },
        ),
        NoiseLayer::new(
            RIVER_MAP,
            NoiseSettings {
                octaves: 6,
                scale: 4.0,
                ..NoiseSettings::default()
            },
        ),
    ]
}

impl GeneratorConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        info!(path = %path.display(), layers = config.layers.len(), "Loaded generator config");
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.map_width == 0 || self.map_height == 0 {
            return Err(TerrainError::InvalidConfig(format!(
                "map size {}x{} must be non-empty",
                self.map_width, self.map_height
            )));
        }
        if self.chunk_size == 0 || self.chunk_size > REGION_SIZE {
            return Err(TerrainError::InvalidConfig(format!(
                "chunk size {} must be in 1..={}",
                self.chunk_size, REGION_SIZE
            )));
        }
        if self.ocean_radius < 0 {
            return Err(TerrainError::InvalidConfig(format!(
                "ocean radius {} must not be negative",
                self.ocean_radius
            )));
        }
        if self.max_regions_per_tick == 0 {
            return Err(TerrainError::InvalidConfig(
                "max regions per tick must be at least 1".to_string(),
            ));
        }
        if !(0..=MAX_VIEW_RADIUS).contains(&self.view_radius) {
            return Err(TerrainError::InvalidConfig(format!(
                "view radius {} must be in 0..={}",
                self.view_radius, MAX_VIEW_RADIUS
            )));
        }

        let mut names = HashSet::new();
        for layer in &self.layers {
            if !names.insert(layer.name.as_str()) {
                return Err(TerrainError::InvalidConfig(format!(
                    "duplicate layer '{}'",
                    layer.name
                )));
            }
            layer.settings.validate(&layer.name)?;
        }

        for required in [OCEAN_MAP, OCEAN_HEIGHT_MAP, OCEAN_MOISTURE_MAP, OCEAN_TEMPERATURE_MAP] {
            if !names.contains(required) {
                return Err(TerrainError::MissingLayer(required.to_string()));
            }
        }
        Ok(())
    }

    pub fn layer(&self, name: &str) -> Option<&NoiseLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Position of a layer in the list, which is also its seed offset.
    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name == name)
    }

    /// Global layers present in this config, with their seed offsets.
    pub fn global_layers(&self) -> Vec<(usize, &NoiseLayer)> {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, l)| GLOBAL_LAYERS.contains(&l.name.as_str()))
            .collect()
    }

    pub fn region_layers(&self) -> Result<RegionLayers> {
        let settings = |name: &str| {
            self.layer(name)
                .map(|l| l.settings.clone())
                .ok_or_else(|| TerrainError::MissingLayer(name.to_string()))
        };
        Ok(RegionLayers {
            height: settings(OCEAN_HEIGHT_MAP)?,
            moisture: settings(OCEAN_MOISTURE_MAP)?,
            temperature: settings(OCEAN_TEMPERATURE_MAP)?,
        })
    }

    pub fn scheduler_params(&self) -> SchedulerParams {
        SchedulerParams {
            chunk_size: self.chunk_size,
            seed: self.seed,
            worker_threads: self.worker_threads,
            visible_on_creation: self.view_full_map,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = GeneratorConfig::default();
        config.validate().unwrap();
        assert_eq!(config.layers.len(), 5);
        assert_eq!(config.layer_index(OCEAN_MAP), Some(3));
        let globals: Vec<_> = config.global_layers().iter().map(|(i, l)| (*i, l.name.clone())).collect();
        assert_eq!(globals, vec![(3, OCEAN_MAP.to_string()), (4, RIVER_MAP.to_string())]);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terrain.json");
        let config = GeneratorConfig {
            seed: 1234,
            chunk_size: 25,
            view_full_map: true,
            ..GeneratorConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(GeneratorConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GeneratorConfig::from_json(r#"{ "seed": 9, "chunk_size": 10 }"#).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.chunk_size, 10);
        assert_eq!(config.ocean_radius, 5);
        assert_eq!(config.layers.len(), 5);
    }

    #[test]
    fn test_rejects_oversized_chunks() {
        let err = GeneratorConfig::from_json(r#"{ "chunk_size": 128 }"#).unwrap_err();
        assert!(matches!(err, TerrainError::InvalidConfig(_)));
    }

    #[test]
    fn test_view_radius_range() {
        let mut config = GeneratorConfig::default();
        config.view_radius = MAX_VIEW_RADIUS;
        assert!(config.validate().is_ok());
        config.view_radius = MAX_VIEW_RADIUS + 1;
        assert!(matches!(config.validate(), Err(TerrainError::InvalidConfig(_))));
        config.view_radius = -1;
        assert!(matches!(config.validate(), Err(TerrainError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_layer_settings() {
        let mut config = GeneratorConfig::default();
        config.layers[1].settings.octaves = 11;
        match config.validate() {
            Err(TerrainError::InvalidSettings { layer, .. }) => assert_eq!(layer, OCEAN_MOISTURE_MAP),
            other => panic!("expected invalid settings, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_ocean_map() {
        let mut config = GeneratorConfig::default();
        config.layers.retain(|l| l.name != OCEAN_MAP);
        assert!(matches!(config.validate(), Err(TerrainError::MissingLayer(name)) if name == OCEAN_MAP));
        // River map is optional.
        let mut config = GeneratorConfig::default();
        config.layers.retain(|l| l.name != RIVER_MAP);
        config.validate().unwrap();
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GeneratorConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, TerrainError::Io(_)));
    }
}
