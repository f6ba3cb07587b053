//! Error types for terrain generation.

use thiserror::Error;

/// Errors surfaced by the generator, scheduler and configuration loader.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// A region was requested that the ocean field has no value for.
    /// The scheduler recovers from this by emitting an all-water region.
    #[error("no ocean data for region ({x}, {y})")]
    MissingOceanData { x: i32, y: i32 },

    /// Height, moisture and temperature fields disagree in size.
    #[error(
        "field dimensions differ: height {height:?}, moisture {moisture:?}, temperature {temperature:?}"
    )]
    DimensionMismatch {
        height: (usize, usize),
        moisture: (usize, usize),
        temperature: (usize, usize),
    },

    /// A noise layer has settings outside their documented range.
    #[error("invalid settings for layer '{layer}': {reason}")]
    InvalidSettings { layer: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A named noise layer the generator needs is not configured.
    #[error("noise layer '{0}' is not configured")]
    MissingLayer(String),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TerrainError>;
