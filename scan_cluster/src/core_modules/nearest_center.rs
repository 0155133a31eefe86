// THEORY:
// The nearest-center lookup is the innermost step of the clustering loop. It is
// a stateless utility, in the same spirit as the spatial detectors elsewhere in
// this crate: given the clusters as they stand right now and one query position,
// it reports which centroid is closest and how far away it is.
//
// The scan is linear and uses a strict less-than comparison, so when two
// centroids are equally close the one in the lower slot wins.

use crate::core_modules::cluster::Cluster;
use crate::core_modules::point::Vec2;

pub mod nearest_center {
    use super::*;

    /// Returns the slot of the cluster whose centroid is closest to `position`,
    /// together with the squared distance to it. `None` when there are no clusters.
    pub fn find_nearest(clusters: &[Cluster], position: Vec2) -> Option<(usize, f64)> {
        let mut clusters = clusters.iter().enumerate();
        let (_, first) = clusters.next()?;

        let mut best_index = 0;
        let mut best_distance = first.centroid.distance_squared(position);
        for (index, cluster) in clusters {
            let distance = cluster.centroid.distance_squared(position);
            if distance < best_distance {
                best_distance = distance;
                best_index = index;
            }
        }

        Some((best_index, best_distance))
    }
}
