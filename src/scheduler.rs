//! Region generation scheduler
//!
//! Regions waiting to be generated sit in a FIFO queue with a companion membership set,
//! so a region is queued at most once at a time. Each call to
//! [`GenerationScheduler::run_generation_pass`] drains a bounded number of items and
//! returns, letting the driving loop interleave generation with everything else it does
//! per tick.
//!
//! Per region:
//!
//! 1. Look up the coarse ocean value. Missing or deep → the region is all water and no
//!    noise is sampled.
//! 2. Otherwise sample height, moisture and temperature (100×100, concurrently) at the
//!    region's pixel offset and classify each cell.
//! 3. Slice the grid into `chunk_size` chunks, rows in parallel, and insert each chunk
//!    unless it is already stored.
//!
//! All work runs on a scheduler-owned rayon pool.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::biomes::{classify_region, BiomeType};
use crate::chunk::{chunks_per_region, ChunkData, ChunkStore, RegionCoord, REGION_SIZE};
use crate::error::{Result, TerrainError};
use crate::noise_field::{self, NoiseSettings};
use crate::ocean::{OceanClass, OceanField};
use crate::seeds::RegionSeeds;
use crate::tilemap::Tilemap;

/// Noise settings for the three per-region climate fields
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionLayers {
    pub height: NoiseSettings,
    pub moisture: NoiseSettings,
    pub temperature: NoiseSettings,
}

/// Scheduler construction parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerParams {
    pub chunk_size: usize,
    pub seed: u64,
    /// Worker threads in the generation pool; 0 uses rayon's default
    pub worker_threads: usize,
    /// Initial visibility of freshly generated chunks
    pub visible_on_creation: bool,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            seed: 0,
            worker_threads: 0,
            visible_on_creation: false,
        }
    }
}

/// What one generation pass did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Items dequeued this pass
    pub processed: usize,
    /// Regions filled with water without sampling noise
    pub water_regions: usize,
    /// Regions generated from noise
    pub noise_regions: usize,
    /// Chunks inserted into the store (already-present chunks are not counted)
    pub chunks_committed: usize,
    /// Items still queued after the pass
    pub remaining: usize,
    pub elapsed: Duration,
}

/// FIFO of regions with set membership
#[derive(Debug, Default)]
pub struct GenerationQueue {
    order: VecDeque<RegionCoord>,
    members: HashSet<RegionCoord>,
}

impl GenerationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unless already present.
    pub fn push(&mut self, region: RegionCoord) -> bool {
        if !self.members.insert(region) {
            return false;
        }
        self.order.push_back(region);
        true
    }

    pub fn pop(&mut self) -> Option<RegionCoord> {
        let region = self.order.pop_front()?;
        self.members.remove(&region);
        Some(region)
    }

    pub fn contains(&self, region: &RegionCoord) -> bool {
        self.members.contains(region)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionCoord> {
        self.order.iter()
    }
}

enum RegionTerrain {
    Water,
    Biomes(Tilemap<BiomeType>),
}

/// Stateless half of the scheduler: turns one region into stored chunks.
struct RegionGenerator {
    store: Arc<ChunkStore>,
    ocean: Arc<OceanField>,
    layers: RegionLayers,
    seeds: RegionSeeds,
    chunk_size: usize,
    chunks_per_region: i32,
    visible_on_creation: bool,
}

impl RegionGenerator {
    fn terrain(&self, region: RegionCoord) -> Result<RegionTerrain> {
        let class = match self.ocean.classify(region) {
            Some(class) => class,
            None => {
                // Recovered locally: the region becomes open water.
                let missing = TerrainError::MissingOceanData {
                    x: region.x,
                    y: region.y,
                };
                error!(region_x = region.x, region_y = region.y, "{}", missing);
                return Ok(RegionTerrain::Water);
            }
        };

        if class == OceanClass::Deep {
            return Ok(RegionTerrain::Water);
        }

        let (offset_x, offset_y) = region.pixel_offset();
        let sample = |settings: &NoiseSettings, seed: u64| {
            noise_field::generate_parallel(
                REGION_SIZE,
                REGION_SIZE,
                settings,
                seed,
                offset_x,
                offset_y,
            )
        };

        let (height, (moisture, temperature)) = rayon::join(
            || sample(&self.layers.height, self.seeds.height),
            || {
                rayon::join(
                    || sample(&self.layers.moisture, self.seeds.moisture),
                    || sample(&self.layers.temperature, self.seeds.temperature),
                )
            },
        );

        let biomes = classify_region(&height, &moisture, &temperature)?;
        Ok(RegionTerrain::Biomes(biomes))
    }

    /// Slice region terrain into chunks and insert them. Returns the number inserted.
    fn commit(&self, region: RegionCoord, terrain: &RegionTerrain) -> usize {
        let size = self.chunk_size;
        let per_region = self.chunks_per_region;

        (0..per_region)
            .into_par_iter()
            .map(|local_y| {
                let mut committed = 0usize;
                for local_x in 0..per_region {
                    let chunk = match terrain {
                        RegionTerrain::Water => ChunkData::water(size, self.visible_on_creation),
                        RegionTerrain::Biomes(biomes) => ChunkData::new(
                            cut_chunk(biomes, local_x as usize * size, local_y as usize * size, size),
                            self.visible_on_creation,
                        ),
                    };
                    let coord = region.chunk(local_x, local_y, per_region);
                    if self.store.insert_if_absent(coord, chunk) {
                        committed += 1;
                    }
                }
                committed
            })
            .sum()
    }
}

/// Copy the `size × size` block at `(x0, y0)` out of a region grid.
fn cut_chunk(biomes: &Tilemap<BiomeType>, x0: usize, y0: usize, size: usize) -> Tilemap<BiomeType> {
    let mut grid = Tilemap::new_with(size, size, BiomeType::Water);
    for (y, row) in grid.rows_mut().enumerate() {
        row.copy_from_slice(&biomes.row(y0 + y)[x0..x0 + size]);
    }
    grid
}

/// Owns the generation queue and the worker pool
pub struct GenerationScheduler {
    queue: GenerationQueue,
    generator: RegionGenerator,
    pool: rayon::ThreadPool,
}

impl GenerationScheduler {
    pub fn new(
        store: Arc<ChunkStore>,
        ocean: Arc<OceanField>,
        layers: RegionLayers,
        params: SchedulerParams,
    ) -> Result<Self> {
        let per_region = chunks_per_region(params.chunk_size);
        if per_region == 0 {
            return Err(TerrainError::InvalidConfig(format!(
                "chunk size {} must be in 1..={}",
                params.chunk_size, REGION_SIZE
            )));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.worker_threads)
            .thread_name(|i| format!("terrain-gen-{}", i))
            .build()?;

        info!(
            chunk_size = params.chunk_size,
            chunks_per_region = per_region,
            threads = pool.current_num_threads(),
            "Generation scheduler ready"
        );

        Ok(Self {
            queue: GenerationQueue::new(),
            generator: RegionGenerator {
                store,
                ocean,
                layers,
                seeds: RegionSeeds::from_base(params.seed),
                chunk_size: params.chunk_size,
                chunks_per_region: per_region,
                visible_on_creation: params.visible_on_creation,
            },
            pool,
        })
    }

    /// Queue a region for generation.
    ///
    /// Returns `false` without change when the region is already queued or all its
    /// chunks are stored.
    pub fn enqueue_region(&mut self, region: RegionCoord) -> bool {
        if self.queue.contains(&region) {
            return false;
        }
        if self
            .generator
            .store
            .region_complete(region, self.generator.chunks_per_region)
        {
            return false;
        }
        self.queue.push(region)
    }

    /// Queue every region within `radius` of the origin that has an ocean sample.
    /// Returns how many were added.
    pub fn seed_from_ocean(&mut self, radius: i32) -> usize {
        let mut added = 0;
        for region in self.generator.ocean.regions_within(radius) {
            if self.enqueue_region(region) {
                added += 1;
            }
        }
        info!(radius, added, "Seeded generation queue from ocean map");
        added
    }

    /// Generate up to `max_items` queued regions, in queue order.
    ///
    /// A failing item is logged and dropped; items not yet reached stay queued and the
    /// error is returned.
    pub fn run_generation_pass(&mut self, max_items: usize) -> Result<PassReport> {
        let start = Instant::now();
        let mut report = PassReport::default();

        while report.processed < max_items {
            let region = match self.queue.pop() {
                Some(region) => region,
                None => break,
            };
            report.processed += 1;

            let generator = &self.generator;
            let outcome = self.pool.install(|| {
                let terrain = generator.terrain(region)?;
                let committed = generator.commit(region, &terrain);
                Ok::<_, TerrainError>((terrain, committed))
            });

            match outcome {
                Ok((terrain, committed)) => {
                    match terrain {
                        RegionTerrain::Water => report.water_regions += 1,
                        RegionTerrain::Biomes(_) => report.noise_regions += 1,
                    }
                    report.chunks_committed += committed;
                    debug!(region_x = region.x, region_y = region.y, committed, "Region generated");
                }
                Err(err) => {
                    error!(
                        region_x = region.x,
                        region_y = region.y,
                        remaining = self.queue.len(),
                        "Region generation failed: {}",
                        err
                    );
                    return Err(err);
                }
            }
        }

        report.remaining = self.queue.len();
        report.elapsed = start.elapsed();
        if report.processed > 0 {
            info!(
                processed = report.processed,
                water = report.water_regions,
                noise = report.noise_regions,
                chunks = report.chunks_committed,
                remaining = report.remaining,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Generation pass complete"
            );
        }
        Ok(report)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_queued(&self, region: &RegionCoord) -> bool {
        self.queue.contains(region)
    }

    pub fn queued(&self) -> impl Iterator<Item = &RegionCoord> {
        self.queue.iter()
    }

    pub fn chunk_size(&self) -> usize {
        self.generator.chunk_size
    }

    pub fn chunks_per_region(&self) -> i32 {
        self.generator.chunks_per_region
    }

    pub fn store(&self) -> &Arc<ChunkStore> {
        &self.generator.store
    }

    pub fn ocean(&self) -> &Arc<OceanField> {
        &self.generator.ocean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkCoord;

    fn scheduler(ocean: OceanField, chunk_size: usize) -> GenerationScheduler {
        let params = SchedulerParams {
            chunk_size,
            seed: 42,
            worker_threads: 2,
            visible_on_creation: false,
        };
        GenerationScheduler::new(
            Arc::new(ChunkStore::new()),
            Arc::new(ocean),
            RegionLayers::default(),
            params,
        )
        .unwrap()
    }

    #[test]
    fn test_queue_membership() {
        let mut queue = GenerationQueue::new();
        assert!(queue.push(RegionCoord::new(1, 1)));
        assert!(!queue.push(RegionCoord::new(1, 1)));
        assert!(queue.push(RegionCoord::new(0, 0)));
        assert_eq!(queue.pop(), Some(RegionCoord::new(1, 1)));
        assert!(!queue.contains(&RegionCoord::new(1, 1)));
        assert!(queue.push(RegionCoord::new(1, 1)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_deep_ocean_region_is_all_water_without_noise() {
        let origin = RegionCoord::new(0, 0);
        let mut sched = scheduler(OceanField::from_entries([(origin, 0.005)]), 10);
        assert!(sched.enqueue_region(origin));

        let report = sched.run_generation_pass(8).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.water_regions, 1);
        assert_eq!(report.noise_regions, 0);
        assert_eq!(report.chunks_committed, 100);

        let store = sched.store();
        for ly in 0..10 {
            for lx in 0..10 {
                let chunk = store.get(&ChunkCoord::new(lx, ly)).unwrap();
                assert!(chunk.is_all_water());
                assert_eq!(chunk.size(), 10);
            }
        }
    }

    #[test]
    fn test_missing_ocean_value_falls_back_to_water() {
        let mut sched = scheduler(OceanField::default(), 50);
        sched.enqueue_region(RegionCoord::new(3, -2));
        let report = sched.run_generation_pass(1).unwrap();
        assert_eq!(report.water_regions, 1);
        assert_eq!(report.chunks_committed, 4);
        assert!(sched.store().get(&ChunkCoord::new(6, -4)).unwrap().is_all_water());
        assert!(sched.store().get(&ChunkCoord::new(7, -3)).unwrap().is_all_water());
    }

    #[test]
    fn test_generation_is_idempotent() {
        let region = RegionCoord::new(0, 0);
        let mut sched = scheduler(OceanField::from_entries([(region, 0.8)]), 20);

        assert!(sched.enqueue_region(region));
        assert!(!sched.enqueue_region(region));
        assert_eq!(sched.pending(), 1);

        let report = sched.run_generation_pass(8).unwrap();
        assert_eq!(report.noise_regions, 1);
        assert_eq!(report.chunks_committed, 25);

        let before: Vec<_> = (0..5)
            .map(|x| sched.store().get(&ChunkCoord::new(x, 0)).unwrap().biomes().clone())
            .collect();

        // Stored regions are refused outright.
        assert!(!sched.enqueue_region(region));
        assert_eq!(sched.store().len(), 25);

        let after: Vec<_> = (0..5)
            .map(|x| sched.store().get(&ChunkCoord::new(x, 0)).unwrap().biomes().clone())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_slicing_with_non_dividing_chunk_size() {
        let region = RegionCoord::new(-1, 1);
        let mut sched = scheduler(OceanField::from_entries([(region, 0.35)]), 16);
        sched.enqueue_region(region);
        let report = sched.run_generation_pass(1).unwrap();
        assert_eq!(report.chunks_committed, 36);
        assert_eq!(sched.store().len(), 36);

        // Rebuild the region grid directly and compare one chunk cell by cell.
        let seeds = RegionSeeds::from_base(42);
        let settings = NoiseSettings::default();
        let (ox, oy) = region.pixel_offset();
        let height = noise_field::generate(100, 100, &settings, seeds.height, ox, oy);
        let moisture = noise_field::generate(100, 100, &settings, seeds.moisture, ox, oy);
        let temperature = noise_field::generate(100, 100, &settings, seeds.temperature, ox, oy);
        let biomes = classify_region(&height, &moisture, &temperature).unwrap();

        let chunk = sched.store().get(&region.chunk(5, 2, 6)).unwrap();
        assert_eq!(chunk.size(), 16);
        for y in 0..16 {
            for x in 0..16 {
                assert_eq!(chunk.biome(x, y), *biomes.get(80 + x, 32 + y));
            }
        }
        // Region (-1, 1) owns chunks -6..=-1 horizontally, 6..=11 vertically.
        assert!(sched.store().contains(&ChunkCoord::new(-6, 6)));
        assert!(sched.store().contains(&ChunkCoord::new(-1, 11)));
        assert!(!sched.store().contains(&ChunkCoord::new(0, 6)));
    }

    #[test]
    fn test_pass_respects_budget_and_order() {
        let ocean = OceanField::from_entries(
            (0..3).map(|x| (RegionCoord::new(x, 0), 0.0)),
        );
        let mut sched = scheduler(ocean, 50);
        for x in [2, 0, 1] {
            sched.enqueue_region(RegionCoord::new(x, 0));
        }

        let report = sched.run_generation_pass(2).unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.remaining, 1);
        assert!(sched.is_queued(&RegionCoord::new(1, 0)));
        assert!(sched.store().contains(&ChunkCoord::new(4, 0)));
        assert!(sched.store().contains(&ChunkCoord::new(0, 0)));

        let report = sched.run_generation_pass(2).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.remaining, 0);

        let report = sched.run_generation_pass(2).unwrap();
        assert_eq!(report, PassReport { elapsed: report.elapsed, ..PassReport::default() });
    }

    #[test]
    fn test_seed_from_ocean() {
        let ocean = OceanField::from_entries([
            (RegionCoord::new(0, 0), 0.5),
            (RegionCoord::new(1, 1), 0.5),
            (RegionCoord::new(2, 0), 0.5),
        ]);
        let mut sched = scheduler(ocean, 25);
        assert_eq!(sched.seed_from_ocean(1), 2);
        assert_eq!(
            sched.queued().copied().collect::<Vec<_>>(),
            vec![RegionCoord::new(0, 0), RegionCoord::new(1, 1)]
        );
    }

    #[test]
    fn test_rejects_oversized_chunks() {
        let result = GenerationScheduler::new(
            Arc::new(ChunkStore::new()),
            Arc::new(OceanField::default()),
            RegionLayers::default(),
            SchedulerParams {
                chunk_size: 101,
                ..SchedulerParams::default()
            },
        );
        assert!(matches!(result, Err(TerrainError::InvalidConfig(_))));
    }
}
