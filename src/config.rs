use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::encoder::Scaling;
use crate::error::{PipelineError, Result};
use crate::features::FeatureConfig;
use crate::model::ModelConfig;

/// Sanity limits applied while ingesting raw laps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Laps slower than this (seconds) are treated as bad timing and dropped.
    pub max_lap_time: f64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { max_lap_time: 300.0 }
    }
}

/// Top-level settings for one training run. Every section is optional in the
/// JSON file and falls back to its default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub ingest: IngestConfig,
    pub features: FeatureConfig,
    pub scaling: Scaling,
    pub model: ModelConfig,
}

impl PipelineConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: PipelineConfig = serde_json::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.features.lags == 0 {
            return Err(PipelineError::Config("features.lags must be at least 1".into()));
        }
        if self.features.rolling_window == 0 {
            return Err(PipelineError::Config(
                "features.rolling_window must be at least 1".into(),
            ));
        }
        if self.model.iterations == 0 {
            return Err(PipelineError::Config("model.iterations must be at least 1".into()));
        }
        if !(self.ingest.max_lap_time > 0.0) {
            return Err(PipelineError::Config(
                "ingest.max_lap_time must be positive".into(),
            ));
        }
        Ok(())
    }
}
