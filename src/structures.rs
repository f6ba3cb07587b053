//! Village placement over a single chunk
//!
//! Villages are seeded at random land cells and grown outward breadth-first over the
//! 8-neighbourhood. Every accepted structure goes into a per-chunk quadtree, which is
//! what enforces the minimum spacing between structures.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunk::{ChunkCoord, ChunkData};
use crate::quadtree::{Point, Quadtree, Rect};
use crate::seeds::chunk_seed;

/// Structure placement tuning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementParams {
    /// Chance per cell of starting a village
    pub village_density: f32,
    /// Chance per neighbour of placing a structure while a village grows
    pub structure_density: f32,
    /// A village stops growing once it has this many structures
    pub min_village_size: usize,
    /// No two structures closer than this on either axis
    pub min_distance: i32,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            village_density: 0.01,
            structure_density: 0.05,
            min_village_size: 5,
            min_distance: 5,
        }
    }
}

/// Working state for one chunk
struct Placer<'a> {
    chunk: &'a ChunkData,
    origin: Point,
    size: i32,
    params: &'a PlacementParams,
    index: Quadtree,
    placed: Vec<Point>,
}

impl<'a> Placer<'a> {
    fn local(&self, p: Point) -> Option<(usize, usize)> {
        let lx = p.x - self.origin.x;
        let ly = p.y - self.origin.y;
        if lx < 0 || ly < 0 || lx >= self.size || ly >= self.size {
            return None;
        }
        Some((lx as usize, ly as usize))
    }

    fn is_water(&self, p: Point) -> bool {
        self.local(p)
            .map_or(false, |(x, y)| self.chunk.biome(x, y).is_water())
    }

    fn near_water(&self, p: Point) -> bool {
        (-1..=1).any(|dy| (-1..=1).any(|dx| self.is_water(Point::new(p.x + dx, p.y + dy))))
    }

    fn is_valid(&self, p: Point) -> bool {
        self.local(p).is_some()
            && !self.is_water(p)
            && !self.near_water(p)
            && !self.index.any_within(p, self.params.min_distance)
    }

    fn accept(&mut self, p: Point) {
        self.index.insert(p);
        self.placed.push(p);
    }

    fn grow_village(&mut self, start: Point, rng: &mut ChaCha8Rng) {
        let mut frontier = VecDeque::from([start]);
        let mut built = 0;

        while built < self.params.min_village_size {
            let Some(pos) = frontier.pop_front() else {
                break;
            };
            for dx in -1..=1 {
                for dy in -1..=1 {
                    let next = Point::new(pos.x + dx, pos.y + dy);
                    if self.local(next).is_none() {
                        continue;
                    }
                    if rng.gen::<f32>() < self.params.structure_density && self.is_valid(next) {
                        self.accept(next);
                        frontier.push_back(next);
                        built += 1;
                    }
                }
            }
        }
    }
}

/// Place villages on one chunk.
///
/// Deterministic for a given `(seed, coord)`. Returned points are world cells in
/// placement order.
pub fn place_structures(
    chunk: &ChunkData,
    coord: ChunkCoord,
    chunk_size: usize,
    params: &PlacementParams,
    seed: u64,
) -> Vec<Point> {
    let (ox, oy) = coord.world_origin(chunk_size);
    let origin = Point::new(ox as i32, oy as i32);
    let size = chunk_size as i32;

    let mut placer = Placer {
        chunk,
        origin,
        size,
        params,
        index: Quadtree::new(Rect::new(
            origin.x as f32,
            origin.y as f32,
            size as f32,
            size as f32,
        )),
        placed: Vec::new(),
    };
    let mut rng = ChaCha8Rng::seed_from_u64(chunk_seed(seed, coord));

    for y in 0..size {
        for x in 0..size {
            let cell = Point::new(origin.x + x, origin.y + y);
            if rng.gen::<f32>() < params.village_density && placer.is_valid(cell) {
                placer.grow_village(cell, &mut rng);
            }
        }
    }

    if !placer.placed.is_empty() {
        debug!(
            chunk_x = coord.x,
            chunk_y = coord.y,
            structures = placer.placed.len(),
            "Placed structures"
        );
    }
    placer.placed
}
