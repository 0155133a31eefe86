// THEORY:
// The `ClusterRegistry` is the single owner of all working state for one
// clustering run. It holds the point store and the list of live clusters as
// plain values and joins them through stable handles.
//
// Key architectural principles:
// 1.  **Single Owner**: Points never point at clusters and clusters never point
//     at points. A point stores a `ClusterHandle`; a cluster stores `PointId`s.
//     The registry is the only place where either is resolved.
// 2.  **Handle-to-Slot Table**: Clusters are kept in registry order in a `Vec`
//     (their "positional index"), and a lookup table maps each live handle to
//     its current slot. Pruning rebuilds the table, so a stale handle resolves
//     to `None` instead of to whichever cluster slid into its old slot.
// 3.  **Monotonic Handles**: Handles are handed out in increasing order and
//     never reused. Comparing a handle against the counter therefore tells the
//     engine whether a cluster already existed at some earlier moment.
// 4.  **Per-Run Lifetime**: A registry is built for one run and consumed when
//     the run returns its result. Nothing is shared across calls.

use crate::core_modules::cluster::{Cluster, ClusterHandle};
use crate::core_modules::point::{Point, PointId};
use crate::error::ClusterError;
use std::collections::HashMap;

/// Owns the points and clusters of a single run.
#[derive(Debug, Clone)]
pub struct ClusterRegistry {
    points: Vec<Point>,
    point_slots: HashMap<PointId, usize>,
    clusters: Vec<Cluster>,
    cluster_slots: HashMap<ClusterHandle, usize>,
    next_handle: u64,
}

impl ClusterRegistry {
    /// Builds a registry over `points`, rejecting duplicate ids and non-finite positions.
    /// Existing assignments on the points are cleared.
    pub fn new(points: Vec<Point>) -> Result<Self, ClusterError> {
        let points: Vec<Point> = points.iter().map(Point::reset).collect();
        let point_slots = index_points(&points)?;
        Ok(Self {
            points,
            point_slots,
            clusters: Vec::new(),
            cluster_slots: HashMap::new(),
            next_handle: 0,
        })
    }

    /// Rebuilds a registry from the output of a previous run, keeping every
    /// assignment and centroid intact.
    pub fn restore(points: Vec<Point>, clusters: Vec<Cluster>) -> Result<Self, ClusterError> {
        let point_slots = index_points(&points)?;
        let next_handle = clusters.iter().map(|c| c.handle.0 + 1).max().unwrap_or(0);
        let mut registry = Self {
            points,
            point_slots,
            clusters,
            cluster_slots: HashMap::new(),
            next_handle,
        };
        registry.rebuild_cluster_slots();
        Ok(registry)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// The handle the next spawned cluster will receive.
    pub fn next_handle(&self) -> ClusterHandle {
        ClusterHandle(self.next_handle)
    }

    /// The current registry slot of a live cluster.
    pub fn slot_of(&self, handle: ClusterHandle) -> Option<usize> {
        self.cluster_slots.get(&handle).copied()
    }

    /// Creates a new cluster seeded at the point in `point_slot` and assigns the
    /// point to it. The new cluster is appended, so its slot equals the old
    /// cluster count.
    pub fn spawn(&mut self, point_slot: usize) -> ClusterHandle {
        let handle = ClusterHandle(self.next_handle);
        self.next_handle += 1;

        self.detach(point_slot);
        let point = &mut self.points[point_slot];
        point.assignment = Some(handle);

        self.cluster_slots.insert(handle, self.clusters.len());
        self.clusters.push(Cluster::seeded(handle, point.id, point.position));
        handle
    }

    /// Moves the point in `point_slot` into `target`. The point is removed from
    /// its previous cluster if that cluster is still live. Returns `false`
    /// without changing anything if `target` is not a live cluster.
    pub fn reassign(&mut self, point_slot: usize, target: ClusterHandle) -> bool {
        let Some(target_slot) = self.slot_of(target) else {
            return false;
        };

        self.detach(point_slot);
        let point = &mut self.points[point_slot];
        point.assignment = Some(target);
        self.clusters[target_slot].add_member(point.id);
        true
    }

    /// Recomputes the centroid of every dirty cluster and prunes every empty one.
    /// Returns the number of clusters pruned.
    pub fn recompute(&mut self) -> usize {
        let points = &self.points;
        let point_slots = &self.point_slots;
        let before = self.clusters.len();

        self.clusters.retain_mut(|cluster| {
            if cluster.is_empty() {
                return false;
            }
            if cluster.dirty {
                let positions = cluster
                    .members
                    .iter()
                    .filter_map(|id| point_slots.get(id))
                    .map(|&slot| points[slot].position)
                    .collect::<Vec<_>>();
                cluster.recompute_centroid(positions);
            }
            true
        });

        let pruned = before - self.clusters.len();
        if pruned > 0 {
            self.rebuild_cluster_slots();
        }
        pruned
    }

    /// Consumes the registry and returns its clusters (in registry order) and points
    /// (in input order).
    pub fn into_parts(self) -> (Vec<Cluster>, Vec<Point>) {
        (self.clusters, self.points)
    }

    /// Removes the point in `point_slot` from its current cluster, if that cluster is live.
    fn detach(&mut self, point_slot: usize) {
        let Point { id, assignment, .. } = self.points[point_slot];
        if let Some(slot) = assignment.and_then(|old| self.slot_of(old)) {
            self.clusters[slot].remove_member(id);
        }
    }

    fn rebuild_cluster_slots(&mut self) {
        self.cluster_slots = self
            .clusters
            .iter()
            .enumerate()
            .map(|(slot, cluster)| (cluster.handle, slot))
            .collect();
    }
}

fn index_points(points: &[Point]) -> Result<HashMap<PointId, usize>, ClusterError> {
    let mut slots = HashMap::with_capacity(points.len());
    for (slot, point) in points.iter().enumerate() {
        if !point.position.is_finite() {
            return Err(ClusterError::NonFinitePosition(point.id));
        }
        if slots.insert(point.id, slot).is_some() {
            return Err(ClusterError::DuplicatePointId(point.id));
        }
    }
    Ok(slots)
}
