pub mod cluster;
pub mod engine;
pub mod nearest_center;
pub mod point;
pub mod registry;
pub mod report;
pub mod scan;
