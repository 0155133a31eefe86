// THEORY:
// A `Cluster` is a dynamically created group of points that share proximity to
// a common centroid. Downstream consumers treat it as one object: a person,
// a post, or anything else the sensor sees as a run of nearby returns.
//
// Key architectural principles:
// 1.  **Identity by Handle**: Each cluster is born with a `ClusterHandle` that
//     never changes and is never reused within a run. Its position in the
//     registry is incidental and may shift when other clusters are pruned.
// 2.  **Membership by Id**: A cluster stores only the `PointId`s of its members.
//     Positions live in the registry's point storage, which keeps the data
//     graph free of shared references.
// 3.  **Lazy Recompute**: Adding or removing a member marks the cluster dirty.
//     The centroid is only recomputed at the end of an assignment pass, and
//     only for dirty, non-empty clusters.

use crate::core_modules::point::{PointId, Vec2};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A stable cluster identity, independent of the cluster's slot in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ClusterHandle(pub u64);

impl fmt::Display for ClusterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// A group of points and their shared centroid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// The stable identity of this cluster for the current run.
    pub handle: ClusterHandle,
    /// The arithmetic mean of the member positions as of the last recompute.
    pub centroid: Vec2,
    /// The ids of every point currently assigned to this cluster.
    pub members: BTreeSet<PointId>,
    /// Set when membership changed since the centroid was last recomputed.
    pub dirty: bool,
}

impl Cluster {
    /// Creates a cluster seeded from a single point. The centroid starts at the
    /// seed position, so a freshly spawned cluster is not dirty.
    pub fn seeded(handle: ClusterHandle, seed: PointId, position: Vec2) -> Self {
        Self {
            handle,
            centroid: position,
            members: BTreeSet::from([seed]),
            dirty: false,
        }
    }

    pub fn add_member(&mut self, id: PointId) {
        if self.members.insert(id) {
            self.dirty = true;
        }
    }

    /// Removes a member. Returns `false` if the point was not a member.
    pub fn remove_member(&mut self, id: PointId) -> bool {
        let removed = self.members.remove(&id);
        if removed {
            self.dirty = true;
        }
        removed
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.members.contains(&id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Replaces the centroid with the mean of `positions` and clears the dirty flag.
    /// Leaves the cluster untouched when `positions` is empty.
    pub fn recompute_centroid<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Vec2>,
    {
        let mut sum = Vec2::ZERO;
        let mut count = 0usize;
        for position in positions {
            sum += position;
            count += 1;
        }
        if count == 0 {
            return;
        }
        let n = count as f64;
        self.centroid = Vec2::new(sum.x / n, sum.y / n);
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_cluster_is_clean() {
        let c = Cluster::seeded(ClusterHandle(0), PointId(4), Vec2::new(1.0, 1.0));
        assert!(!c.dirty);
        assert!(c.contains(PointId(4)));
        assert_eq!(c.centroid, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn membership_changes_mark_dirty() {
        let mut c = Cluster::seeded(ClusterHandle(0), PointId(0), Vec2::ZERO);
        c.add_member(PointId(1));
        assert!(c.dirty);
        c.dirty = false;

        // Re-adding an existing member is not a change.
        c.add_member(PointId(1));
        assert!(!c.dirty);

        assert!(c.remove_member(PointId(0)));
        assert!(c.dirty);
        assert!(!c.remove_member(PointId(0)));
    }

    #[test]
    fn recompute_takes_the_mean() {
        let mut c = Cluster::seeded(ClusterHandle(1), PointId(0), Vec2::ZERO);
        c.add_member(PointId(1));
        c.recompute_centroid([Vec2::new(0.0, 0.0), Vec2::new(2.0, 4.0)]);
        assert_eq!(c.centroid, Vec2::new(1.0, 2.0));
        assert!(!c.dirty);
    }

    #[test]
    fn recompute_with_no_positions_is_a_no_op() {
        let mut c = Cluster::seeded(ClusterHandle(1), PointId(0), Vec2::new(3.0, 3.0));
        c.dirty = true;
        c.recompute_centroid(std::iter::empty());
        assert_eq!(c.centroid, Vec2::new(3.0, 3.0));
        assert!(c.dirty);
    }
}
