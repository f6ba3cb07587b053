//! World assembly and the per-tick driver.
//!
//! Building a world generates the global layers once, derives the ocean field from the
//! "Ocean Map" layer and seeds the generation queue around the origin. After that the
//! owner calls [`TerrainWorld::tick`] once per frame.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::chunk::{ChunkCoord, ChunkStore};
use crate::config::{GeneratorConfig, OCEAN_MAP};
use crate::error::{Result, TerrainError};
use crate::noise_field::{self, NoiseField};
use crate::ocean::OceanField;
use crate::quadtree::Point;
use crate::scheduler::{GenerationScheduler, PassReport};
use crate::seeds::layer_seed;
use crate::streaming::{StreamingController, VisibilityChange};
use crate::structures::place_structures;

/// What one tick did
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    pub tick: u64,
    pub visibility: Option<VisibilityChange>,
    pub pass: PassReport,
}

/// Complete streamed terrain
pub struct TerrainWorld {
    config: GeneratorConfig,
    layers: HashMap<String, NoiseField>,
    ocean: Arc<OceanField>,
    store: Arc<ChunkStore>,
    scheduler: GenerationScheduler,
    streaming: StreamingController,
    /// Visibility change from a tick whose generation pass failed
    unreported: Option<VisibilityChange>,
    ticks: u64,
}

impl TerrainWorld {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let start = Instant::now();

        let layers = generate_global_layers(&config);
        let ocean_map = layers
            .get(OCEAN_MAP)
            .ok_or_else(|| TerrainError::MissingLayer(OCEAN_MAP.to_string()))?;
        let ocean = Arc::new(OceanField::from_field(ocean_map));

        let store = Arc::new(ChunkStore::new());
        let mut scheduler = GenerationScheduler::new(
            Arc::clone(&store),
            Arc::clone(&ocean),
            config.region_layers()?,
            config.scheduler_params(),
        )?;
        scheduler.seed_from_ocean(config.ocean_radius);

        let streaming = StreamingController::new(config.chunk_size, config.view_radius);

        info!(
            seed = config.seed,
            layers = layers.len(),
            ocean_regions = ocean.len(),
            queued = scheduler.pending(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Terrain world ready"
        );

        Ok(Self {
            config,
            layers,
            ocean,
            store,
            scheduler,
            streaming,
            unreported: None,
            ticks: 0,
        })
    }

    /// One visibility update followed by one bounded generation pass.
    ///
    /// If the pass fails the tick is not counted and its visibility change is carried
    /// into the report of the next successful tick.
    pub fn tick(&mut self) -> Result<TickReport> {
        let update = self.streaming.update_visible(&self.store, &mut self.scheduler);
        let visibility = match (self.unreported.take(), update) {
            (Some(mut earlier), Some(later)) => {
                earlier.absorb(later);
                Some(earlier)
            }
            (earlier, later) => earlier.or(later),
        };

        match self
            .scheduler
            .run_generation_pass(self.config.max_regions_per_tick)
        {
            Ok(pass) => {
                self.ticks += 1;
                Ok(TickReport {
                    tick: self.ticks,
                    visibility,
                    pass,
                })
            }
            Err(err) => {
                if let Some(change) = visibility {
                    warn!(
                        shown = change.shown.len(),
                        hidden = change.hidden.len(),
                        "Generation pass failed, carrying visibility change to next tick"
                    );
                    self.unreported = Some(change);
                }
                Err(err)
            }
        }
    }

    /// Run generation passes until the queue drains or `max_passes` is reached.
    /// Returns the number of passes run.
    pub fn generate_pending(&mut self, max_passes: usize) -> Result<usize> {
        let mut passes = 0;
        while self.scheduler.pending() > 0 && passes < max_passes {
            self.scheduler
                .run_generation_pass(self.config.max_regions_per_tick)?;
            passes += 1;
        }
        Ok(passes)
    }

    pub fn set_viewpoint(&mut self, x: f32, y: f32) {
        self.streaming.set_position(x, y);
    }

    pub fn fit_to_view(&mut self, view_width: f32, view_height: f32) {
        self.streaming.fit_to_view(view_width, view_height);
    }

    /// Villages for a stored chunk, or `None` if the chunk is not generated yet.
    pub fn place_structures(&self, coord: ChunkCoord) -> Option<Vec<Point>> {
        let chunk = self.store.get(&coord)?;
        Some(place_structures(
            &chunk,
            coord,
            self.config.chunk_size,
            &self.config.placement,
            self.config.seed,
        ))
    }

    /// A global layer by name.
    pub fn layer(&self, name: &str) -> Option<&NoiseField> {
        self.layers.get(name)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn ocean(&self) -> &Arc<OceanField> {
        &self.ocean
    }

    pub fn store(&self) -> &Arc<ChunkStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &GenerationScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut GenerationScheduler {
        &mut self.scheduler
    }

    pub fn streaming(&self) -> &StreamingController {
        &self.streaming
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// Generate every configured global layer concurrently. Each layer's seed is the base
/// seed plus its position in the layer list.
fn generate_global_layers(config: &GeneratorConfig) -> HashMap<String, NoiseField> {
    config
        .global_layers()
        .into_par_iter()
        .map(|(index, layer)| {
            let field = noise_field::generate_parallel(
                config.map_width,
                config.map_height,
                &layer.settings,
                layer_seed(config.seed, index),
                0,
                0,
            );
            (layer.name.clone(), field)
        })
        .collect()
}
