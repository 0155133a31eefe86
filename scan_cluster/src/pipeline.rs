// THEORY:
// The `pipeline` module is the top-level API of the crate. It encapsulates the
// full per-tick stack behind a single call: a raw sweep goes in, a
// transport-ready `ClusterReport` comes out.
//
// Stages of a tick:
// 1.  **Projection & Filtering**: raw nodes become scene points; anything outside
//     the region or inside an exclusion zone is dropped (`core_modules::scan`).
// 2.  **Clustering**: the surviving points are grouped by the bounded-iteration
//     engine (`core_modules::engine`). A frame with no surviving points skips
//     this stage entirely.
// 3.  **Reporting**: clusters are summarized and filtered by membership
//     (`core_modules::report`).
//
// The pipeline is synchronous. It owns the engine and a frame counter, and keeps
// the last clustering around for inspection, but no clustering state flows from
// one tick into the next.

use crate::config::ScanConfig;
use crate::core_modules::engine::{Clustering, ClusteringEngine};
use crate::core_modules::scan::project_scan;
use crate::error::PipelineError;
use tracing::{debug, info};

// Re-export key data structures for the public API.
pub use crate::core_modules::report::{ClusterReport, ClusterSummary};
pub use crate::core_modules::scan::ScanNode;

/// The main, top-level struct: one sweep in, one report out.
pub struct ScanPipeline {
    config: ScanConfig,
    engine: ClusteringEngine,
    frame_count: u64,
    last_clustering: Option<Clustering>,
}

impl ScanPipeline {
    /// Builds a pipeline from a validated configuration.
    pub fn new(config: ScanConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let engine = match config.seed {
            Some(seed) => ClusteringEngine::with_seed(config.engine, seed),
            None => ClusteringEngine::new(config.engine),
        };
        info!(
            max_clusters = config.engine.max_clusters,
            max_iterations = config.engine.max_iterations,
            distance_threshold = config.engine.distance_threshold,
            exclusion_zones = config.exclusion_zones.len(),
            "scan pipeline ready"
        );
        Ok(Self {
            config,
            engine,
            frame_count: 0,
            last_clustering: None,
        })
    }

    /// Processes one sweep and returns the report for it.
    pub fn process_scan(&mut self, nodes: &[ScanNode]) -> Result<ClusterReport, PipelineError> {
        let frame = self.frame_count;
        self.frame_count += 1;

        // Stage 1: Projection & Filtering
        let points = project_scan(nodes, &self.config.mount, &self.config.region, &self.config.exclusion_zones);
        if points.is_empty() {
            debug!(frame, nodes = nodes.len(), "no points in region");
            self.last_clustering = None;
            return Ok(ClusterReport::empty(frame));
        }

        // Stage 2: Clustering
        let clustering = self.engine.run_default(&points)?;

        // Stage 3: Reporting
        let report = ClusterReport::from_clustering(frame, &clustering, &self.config.region, self.config.min_members);
        debug!(
            frame,
            nodes = nodes.len(),
            points = points.len(),
            clusters = clustering.len(),
            reported = report.clusters.len(),
            "frame processed"
        );
        self.last_clustering = Some(clustering);
        Ok(report)
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Number of sweeps processed so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The full clustering of the most recent frame, if it had any points.
    pub fn last_clustering(&self) -> Option<&Clustering> {
        self.last_clustering.as_ref()
    }
}
