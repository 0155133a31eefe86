// THEORY:
// The `point` module holds the smallest unit of data in the engine: a single
// sample from one sensor sweep. Everything the clustering layer does is built
// on top of these "dumb" value records.
//
// Key architectural principles:
// 1.  **Stable Identity**: Every `Point` carries a caller-assigned `PointId`.
//     The id never changes during a run and is the only thing a cluster
//     stores about its members, so clusters never hold references into the
//     point storage.
// 2.  **Handle-Based Assignment**: A point refers to its cluster through a
//     `ClusterHandle`, not through the cluster's position in a list. Pruning a
//     cluster can never silently redirect a point to a different cluster.
// 3.  **Fixed 2D Geometry**: `Vec2` is a plain Euclidean 2D vector. Distances
//     are compared squared so the hot loop never takes a square root.

use crate::core_modules::cluster::ClusterHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul};

/// A 2D coordinate in the sensor's plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to `other`.
    pub fn distance_squared(self, other: Vec2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// The caller-assigned identity of a point. Unique within a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PointId(pub u32);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single sample from one sweep, together with its current cluster assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Stable identifier supplied by the caller.
    pub id: PointId,
    /// Position in the sensor plane.
    pub position: Vec2,
    /// The cluster this point currently belongs to, or `None` while unassigned.
    pub assignment: Option<ClusterHandle>,
}

impl Point {
    /// Creates a fresh, unassigned point.
    pub fn new(id: u32, x: f64, y: f64) -> Self {
        Self {
            id: PointId(id),
            position: Vec2::new(x, y),
            assignment: None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.assignment.is_some()
    }

    /// Returns a copy of this point with its assignment cleared, ready for a new run.
    pub fn reset(&self) -> Self {
        Self {
            assignment: None,
            ..self.clone()
        }
    }
}
