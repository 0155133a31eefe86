// THEORY:
// The `scan` module is the bridge between a raw 2D lidar sweep and the point
// frame the clustering engine consumes. It plays the same role for sweeps that
// chunk extraction plays for image frames: it turns sensor-native data into the
// engine's own vocabulary and throws away everything that cannot matter.
//
// Key architectural principles & steps:
// 1.  **Decoding**: A sweep arrives as a list of `ScanNode`s. Nodes can be built
//     from the fixed-point layout the sensor reports (angle in 1/64 degree
//     steps above a check bit, distance in quarter millimetres).
// 2.  **Projection**: Each node is rotated by the sensor's mounting angle,
//     mirrored when the sensor is mounted upside down, scaled into scene units
//     and offset by the sensor's position.
// 3.  **Region Filtering**: The scene is an axis-aligned box whose lower edge
//     may be sloped: past the `slope` x coordinate, the lowest accepted y rises
//     linearly towards the top of the box. This cuts away walls and floors that
//     would otherwise form permanent clusters.
// 4.  **Exclusion Zones**: Circular zones drop returns from static objects
//     (pillars, furniture) inside the region.
// 5.  **Identity**: Surviving points are numbered in acceptance order, which gives
//     every point in a frame a unique, stable id for the engine's run.

use crate::core_modules::point::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Number of low bits in the raw angle field that are not part of the angle.
const ANGLE_SHIFT: u16 = 1;
/// Raw angle units per degree.
const ANGLE_UNITS_PER_DEGREE: f64 = 64.0;
/// Raw distance units per millimetre.
const DISTANCE_UNITS_PER_MM: f64 = 4.0;

/// A single measurement from one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanNode {
    /// Bearing of the measurement in degrees, in the sensor's own frame.
    pub angle_deg: f64,
    /// Measured range in millimetres. Zero means no return.
    pub distance_mm: f64,
}

impl ScanNode {
    pub fn new(angle_deg: f64, distance_mm: f64) -> Self {
        Self { angle_deg, distance_mm }
    }

    /// Decodes the sensor's fixed-point measurement layout.
    pub fn from_raw(angle_q6_checkbit: u16, distance_q2: u16) -> Self {
        Self {
            angle_deg: (angle_q6_checkbit >> ANGLE_SHIFT) as f64 / ANGLE_UNITS_PER_DEGREE,
            distance_mm: distance_q2 as f64 / DISTANCE_UNITS_PER_MM,
        }
    }
}

/// Where and how the sensor is mounted in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorMount {
    /// Sensor origin in scene units.
    pub position: Vec2,
    /// Mounting rotation in degrees, added to every bearing.
    pub rotation_deg: f64,
    /// Set when the sensor faces down, which mirrors the sweep direction.
    pub top_down: bool,
    /// Scene units per millimetre of range.
    pub distance_scale: f64,
}

impl Default for SensorMount {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation_deg: 0.0,
            top_down: false,
            distance_scale: 0.1,
        }
    }
}

impl SensorMount {
    /// Projects a node into scene coordinates. `None` for nodes without a return.
    pub fn project(&self, node: &ScanNode) -> Option<Vec2> {
        let distance = node.distance_mm * self.distance_scale;
        if distance.is_nan() || distance <= 0.0 {
            return None;
        }
        let direction = if self.top_down { -1.0 } else { 1.0 };
        let angle = self.rotation_deg.to_radians() + direction * node.angle_deg.to_radians();
        Some(self.position + Vec2::new(angle.cos(), angle.sin()) * distance)
    }
}

/// The accepted area of the scene: a box with an optionally sloped lower edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub min: Vec2,
    pub max: Vec2,
    /// The x coordinate where the lower edge starts to rise towards `max.y`.
    pub slope: f64,
}

impl Default for Region {
    fn default() -> Self {
        Self::rect(Vec2::new(-1000.0, -1000.0), Vec2::new(1000.0, 1000.0))
    }
}

impl Region {
    /// A plain rectangle. Placing the slope start on the right edge keeps the
    /// lower edge flat.
    pub fn rect(min: Vec2, max: Vec2) -> Self {
        Self { min, max, slope: max.x }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// The lowest accepted y coordinate at a given x.
    pub fn lower_edge(&self, x: f64) -> f64 {
        let span = self.max.x - self.slope;
        let t = if span > 0.0 { ((x - self.slope) / span).clamp(0.0, 1.0) } else { 0.0 };
        self.min.y + (self.max.y - self.min.y) * t
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.lower_edge(p.x) && p.y <= self.max.y
    }

    /// Maps a position into the unit square spanned by the region.
    pub fn normalize(&self, p: Vec2) -> Vec2 {
        Vec2::new((p.x - self.min.x) / self.width(), (p.y - self.min.y) / self.height())
    }
}

/// A circular area whose returns are always discarded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExclusionZone {
    pub center: Vec2,
    pub radius: f64,
}

impl ExclusionZone {
    pub fn contains(&self, p: Vec2) -> bool {
        self.center.distance_squared(p) < self.radius * self.radius
    }
}

/// Turns a raw sweep into a fresh, unassigned point frame for the clustering engine.
/// Nodes are taken in ascending angle order, so point ids follow the sweep.
pub fn project_scan(nodes: &[ScanNode], mount: &SensorMount, region: &Region, zones: &[ExclusionZone]) -> Vec<Point> {
    let mut ordered: Vec<&ScanNode> = nodes.iter().collect();
    ordered.sort_by(|a, b| a.angle_deg.total_cmp(&b.angle_deg));

    let mut points = Vec::with_capacity(nodes.len());
    for node in ordered {
        let Some(p) = mount.project(node) else {
            continue;
        };
        if !region.contains(p) || zones.iter().any(|zone| zone.contains(p)) {
            continue;
        }
        points.push(Point::new(points.len() as u32, p.x, p.y));
    }
    points
}
