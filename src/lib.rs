//! Chunk-streamed 2D terrain library
//!
//! Re-exports modules for use by binaries and tools.

pub mod ascii;
pub mod biomes;
pub mod chunk;
pub mod config;
pub mod error;
pub mod logging;
pub mod noise_field;
pub mod ocean;
pub mod quadtree;
pub mod scheduler;
pub mod seeds;
pub mod streaming;
pub mod structures;
pub mod tilemap;
pub mod world;

pub use error::{Result, TerrainError};
