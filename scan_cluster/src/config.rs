// THEORY:
// `ScanConfig` gathers every tunable of a deployment in one serializable value:
// how often the sensor is polled, how it is mounted, which part of the scene is
// watched, and how the clustering engine is parameterized. It is loaded once at
// startup from a JSON file; every section is optional and falls back to the
// defaults below, so a minimal file only needs to describe the scan region.

use crate::core_modules::engine::EngineConfig;
use crate::core_modules::scan::{ExclusionZone, Region, SensorMount};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_FRAME_RATE: f64 = 30.0;
const MIN_FRAME_RATE: f64 = 1.0;
const MAX_FRAME_RATE: f64 = 1000.0;

/// Complete configuration for a scan pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Sensor polls per second, at most 1000. Values below one are treated as one.
    pub frame_rate: f64,
    pub engine: EngineConfig,
    pub mount: SensorMount,
    pub region: Region,
    pub exclusion_zones: Vec<ExclusionZone>,
    /// Clusters with this many members or fewer are left out of reports.
    pub min_members: usize,
    /// Fixed seed for the engine's random source. Entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            engine: EngineConfig::default(),
            mount: SensorMount::default(),
            region: Region::default(),
            exclusion_zones: Vec::new(),
            min_members: 0,
            seed: None,
        }
    }
}

impl ScanConfig {
    /// Reads, parses and validates a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parses and validates a JSON config document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// The wall-clock budget of a single tick.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate.max(MIN_FRAME_RATE).min(MAX_FRAME_RATE))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.frame_rate.is_finite() {
            return Err(invalid(format!("frame_rate must be finite, got {}", self.frame_rate)));
        }
        if self.frame_rate > MAX_FRAME_RATE {
            return Err(invalid(format!(
                "frame_rate must be at most {MAX_FRAME_RATE}, got {}",
                self.frame_rate
            )));
        }
        let threshold = self.engine.distance_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(invalid(format!(
                "engine.distance_threshold must be finite and non-negative, got {threshold}"
            )));
        }
        let scale = self.mount.distance_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(invalid(format!("mount.distance_scale must be positive, got {scale}")));
        }
        let region = &self.region;
        if !region.min.is_finite() || !region.max.is_finite() || !region.slope.is_finite() {
            return Err(invalid("region bounds must be finite".to_string()));
        }
        if region.width() <= 0.0 || region.height() <= 0.0 {
            return Err(invalid(format!(
                "region max ({}, {}) must lie above and to the right of min ({}, {})",
                region.max.x, region.max.y, region.min.x, region.min.y
            )));
        }
        if let Some(zone) = self
            .exclusion_zones
            .iter()
            .find(|z| !z.center.is_finite() || !z.radius.is_finite() || z.radius < 0.0)
        {
            return Err(invalid(format!("invalid exclusion zone {zone:?}")));
        }
        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}
