// THEORY:
// The `report` module is the last step of a tick. It condenses a `Clustering`
// into the small, transport-ready summary that downstream consumers care about:
// where each meaningful cluster is, in both scene units and in coordinates
// normalized to the scan region, and how many points back it up.
//
// Clusters at or below the minimum membership are treated as noise and are left
// out of the report entirely.

use crate::core_modules::engine::Clustering;
use crate::core_modules::point::Vec2;
use crate::core_modules::scan::Region;
use serde::Serialize;

/// The downstream view of a single cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    /// Cluster centroid in scene units.
    pub centroid: Vec2,
    /// Centroid mapped into the unit square of the scan region.
    pub normalized: Vec2,
    /// Number of points in the cluster.
    pub member_count: usize,
}

/// Everything a tick produces for downstream consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterReport {
    /// Sequence number of the frame this report was built from.
    pub frame: u64,
    /// Number of points that survived filtering and entered the engine.
    pub point_count: usize,
    /// Reported clusters, in registry order.
    pub clusters: Vec<ClusterSummary>,
}

impl ClusterReport {
    /// A report for a frame in which no point survived filtering.
    pub fn empty(frame: u64) -> Self {
        Self {
            frame,
            ..Self::default()
        }
    }

    /// Summarizes every cluster with strictly more than `min_members` points.
    pub fn from_clustering(frame: u64, clustering: &Clustering, region: &Region, min_members: usize) -> Self {
        let clusters = clustering
            .clusters()
            .iter()
            .filter(|cluster| cluster.member_count() > min_members)
            .map(|cluster| ClusterSummary {
                centroid: cluster.centroid,
                normalized: region.normalize(cluster.centroid),
                member_count: cluster.member_count(),
            })
            .collect();

        Self {
            frame,
            point_count: clustering.points().len(),
            clusters,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}
