// THEORY:
// The `ClusteringEngine` is the orchestrating component of the clustering layer.
// It implements a greedy, threshold-gated, online variant of k-means that is
// tuned for a real-time loop rather than for cluster quality.
//
// Key architectural principles & algorithm steps:
// 1.  **Seeding**: A run starts with exactly one cluster, seeded from a point
//     picked uniformly at random. The random source is injected, so a run is
//     fully reproducible under a fixed seed.
// 2.  **Assignment Pass**: Every point, in input order, looks up its nearest
//     centroid. An unassigned point that is farther than the threshold from
//     every centroid founds a new cluster, as long as the cluster cap allows
//     it. Any other point whose nearest cluster differs from its current one
//     is moved there. A cluster founded during a pass cannot receive moved
//     points until the next pass.
// 3.  **Recompute Pass**: Dirty clusters get their centroid reset to the mean
//     of their members; clusters left empty are pruned.
// 4.  **Bounded Latency**: The loop stops as soon as a pass changes nothing, or
//     when the iteration budget is spent. The result is always available
//     within `max_iterations` passes, whatever the input looks like.
// 5.  **Stateless Between Calls**: Each call builds its own `ClusterRegistry`
//     and hands the final state back to the caller as a `Clustering`. The
//     engine keeps only its configuration and its random source.
//
// The cap on cluster count bounds newly spawned clusters only. The seed cluster
// is created unconditionally, and with a cap of zero the engine runs in
// seed-only mode: the seed cluster accepts points within the threshold and
// everything else stays unassigned.

use crate::core_modules::cluster::{Cluster, ClusterHandle};
use crate::core_modules::nearest_center::nearest_center::find_nearest;
use crate::core_modules::point::{Point, PointId};
use crate::core_modules::registry::ClusterRegistry;
use crate::error::{ClusterError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub const DEFAULT_MAX_CLUSTERS: usize = 16;
pub const DEFAULT_MAX_ITERATIONS: usize = 6;
pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 30.0;

/// Tunable parameters of the clustering engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The most clusters a run may spawn. The seed cluster is always created.
    pub max_clusters: usize,
    /// The most assignment/recompute passes a run may perform.
    pub max_iterations: usize,
    /// Linear distance beyond which an unassigned point may found a new cluster.
    pub distance_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_clusters: DEFAULT_MAX_CLUSTERS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
        }
    }
}

/// The outcome of one run: the surviving clusters and the final state of every point.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    clusters: Vec<Cluster>,
    points: Vec<Point>,
    iterations: usize,
    converged: bool,
}

impl Clustering {
    fn from_registry(registry: ClusterRegistry, iterations: usize, converged: bool) -> Self {
        let (clusters, points) = registry.into_parts();
        Self {
            clusters,
            points,
            iterations,
            converged,
        }
    }

    /// The surviving clusters, in registry order. A cluster's positional index is its
    /// index in this slice.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// The clustered points, in input order, with their final assignments.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// How many passes the run performed.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the last pass made no spawns or reassignments.
    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// The positional index of the cluster the given point ended up in.
    pub fn cluster_index_of(&self, id: PointId) -> Option<usize> {
        let handle = self.handle_of(id)?;
        self.clusters.iter().position(|c| c.handle == handle)
    }

    pub fn cluster_of(&self, id: PointId) -> Option<&Cluster> {
        self.cluster_index_of(id).map(|index| &self.clusters[index])
    }

    /// Points the run left unassigned.
    pub fn unassigned(&self) -> impl Iterator<Item = &Point> {
        self.points.iter().filter(|p| !p.is_assigned())
    }

    fn handle_of(&self, id: PointId) -> Option<ClusterHandle> {
        self.points.iter().find(|p| p.id == id)?.assignment
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct PassChanges {
    spawned: usize,
    reassigned: usize,
}

impl PassChanges {
    fn is_empty(&self) -> bool {
        self.spawned == 0 && self.reassigned == 0
    }
}

/// Groups a frame of 2D points into a bounded number of clusters within a fixed
/// iteration budget.
pub struct ClusteringEngine<R = ChaCha8Rng> {
    config: EngineConfig,
    rng: R,
}

impl ClusteringEngine<ChaCha8Rng> {
    /// Creates an engine whose seed picks are drawn from an entropy-seeded generator.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_rng(config, ChaCha8Rng::from_entropy())
    }

    /// Creates an engine whose seed picks are reproducible.
    pub fn with_seed(config: EngineConfig, seed: u64) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl Default for ClusteringEngine<ChaCha8Rng> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<R: Rng> ClusteringEngine<R> {
    pub fn with_rng(config: EngineConfig, rng: R) -> Self {
        Self { config, rng }
    }

    /// Sets the cluster cap and the iteration budget.
    pub fn configure(&mut self, max_clusters: usize, max_iterations: usize) {
        self.config.max_clusters = max_clusters;
        self.config.max_iterations = max_iterations;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs with the configured distance threshold.
    pub fn run_default(&mut self, points: &[Point]) -> Result<Clustering> {
        let threshold = self.config.distance_threshold;
        self.run(points, threshold)
    }

    /// Clusters every point in `points`.
    pub fn run(&mut self, points: &[Point], threshold: f64) -> Result<Clustering> {
        self.run_counted(points, points.len(), threshold)
    }

    /// Clusters the first `count` points of `points`. Fails if `count` is zero or
    /// larger than the collection. Incoming assignments are ignored.
    pub fn run_counted(&mut self, points: &[Point], count: usize, threshold: f64) -> Result<Clustering> {
        if count == 0 {
            return Err(ClusterError::EmptyInput);
        }
        if count > points.len() {
            return Err(ClusterError::CountOutOfRange {
                count,
                len: points.len(),
            });
        }
        let threshold_sq = squared_threshold(threshold)?;
        let mut registry = ClusterRegistry::new(points[..count].to_vec())?;

        // --- 1. Seed ---
        let seed_slot = self.rng.gen_range(0..count);
        let seed = registry.spawn(seed_slot);
        trace!(point = %registry.points()[seed_slot].id, cluster = %seed, "seeded first cluster");

        // --- 2. Iterate ---
        let (iterations, converged) = iterate(&self.config, &mut registry, threshold_sq);
        debug!(
            points = count,
            clusters = registry.cluster_count(),
            iterations,
            converged,
            "clustering run complete"
        );

        Ok(Clustering::from_registry(registry, iterations, converged))
    }

    /// Re-enters the iteration loop on a previous result without re-seeding.
    /// Refining a converged result performs one pass and changes nothing.
    pub fn refine(&self, clustering: Clustering, threshold: f64) -> Result<Clustering> {
        let threshold_sq = squared_threshold(threshold)?;
        let Clustering { clusters, points, .. } = clustering;
        if points.is_empty() {
            return Err(ClusterError::EmptyInput);
        }
        let mut registry = ClusterRegistry::restore(points, clusters)?;
        let (iterations, converged) = iterate(&self.config, &mut registry, threshold_sq);
        Ok(Clustering::from_registry(registry, iterations, converged))
    }
}

fn squared_threshold(threshold: f64) -> Result<f64> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(ClusterError::InvalidThreshold(threshold));
    }
    Ok(threshold * threshold)
}

/// Runs assignment and recompute passes until nothing changes or the budget is spent.
fn iterate(config: &EngineConfig, registry: &mut ClusterRegistry, threshold_sq: f64) -> (usize, bool) {
    let mut iterations = 0;
    while iterations < config.max_iterations {
        iterations += 1;
        let changes = assignment_pass(registry, config.max_clusters, threshold_sq);
        let pruned = registry.recompute();
        debug!(
            pass = iterations,
            spawned = changes.spawned,
            reassigned = changes.reassigned,
            pruned,
            clusters = registry.cluster_count(),
            "clustering pass"
        );
        if changes.is_empty() {
            return (iterations, true);
        }
    }
    (iterations, false)
}

fn assignment_pass(registry: &mut ClusterRegistry, max_clusters: usize, threshold_sq: f64) -> PassChanges {
    let mut changes = PassChanges::default();
    // Clusters with a handle at or past this mark were spawned during this pass.
    let pass_start = registry.next_handle();

    for slot in 0..registry.points().len() {
        let point = &registry.points()[slot];
        let (id, position, current) = (point.id, point.position, point.assignment);

        let Some((nearest_slot, distance_sq)) = find_nearest(registry.clusters(), position) else {
            continue;
        };
        let nearest = registry.clusters()[nearest_slot].handle;

        if current.is_none() && distance_sq > threshold_sq {
            if registry.cluster_count() < max_clusters {
                let handle = registry.spawn(slot);
                trace!(point = %id, cluster = %handle, "spawned cluster");
                changes.spawned += 1;
                continue;
            }
            if max_clusters == 0 {
                // Seed-only mode: outliers stay unassigned.
                continue;
            }
        }

        if current != Some(nearest) && nearest < pass_start && registry.reassign(slot, nearest) {
            changes.reassigned += 1;
        }
    }

    changes
}
