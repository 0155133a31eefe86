// THEORY:
// This file is the main entry point for the `scan_cluster` library crate.
// It exposes the clustering engine as a small, self-contained API and wraps it
// in a per-tick pipeline for callers that start from raw sensor sweeps.
//
// The layers, from the bottom up:
// - `core_modules`: points, clusters, the registry that owns them for one run,
//   the nearest-center lookup, the engine, and the scan/report collaborators.
// - `pipeline`: one sweep in, one `ClusterReport` out.
// - `runner`: an async tick driver that feeds a pipeline from a stream.
// - `config` and `error`: the ambient configuration and error types.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;
pub mod runner;

pub use config::ScanConfig;
pub use core_modules::cluster::{Cluster, ClusterHandle};
pub use core_modules::engine::{Clustering, ClusteringEngine, EngineConfig};
pub use core_modules::point::{Point, PointId, Vec2};
pub use error::{ClusterError, ConfigError, PipelineError};
pub use pipeline::{ClusterReport, ClusterSummary, ScanNode, ScanPipeline};
