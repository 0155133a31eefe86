// THEORY:
// Every failure in this crate is local to one call: a bad frame or a bad run
// never leaves state behind that could poison the next tick. The error types
// below mirror the three layers of the crate (the engine, the configuration,
// and the pipeline that glues them together).

use crate::core_modules::point::PointId;
use thiserror::Error;

/// Invalid input handed to the clustering engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClusterError {
    /// A run needs at least one point to seed the first cluster.
    #[error("cannot cluster an empty point set")]
    EmptyInput,

    /// The declared point count does not fit the supplied collection.
    #[error("point count {count} is out of range for a collection of {len} points")]
    CountOutOfRange { count: usize, len: usize },

    /// Two points in the same run share an id.
    #[error("point id {0} appears more than once in the input")]
    DuplicatePointId(PointId),

    /// A point has a NaN or infinite coordinate.
    #[error("point {0} has a non-finite position")]
    NonFinitePosition(PointId),

    /// The distance threshold must be a finite, non-negative length.
    #[error("distance threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),
}

/// Failure to load or validate a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure while processing a single scan frame.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = ClusterError> = std::result::Result<T, E>;
