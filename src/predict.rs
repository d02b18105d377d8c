use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::encoder::FeatureLookup;
use crate::error::{PipelineError, Result};
use crate::features::{FeatureRow, FeatureSchema};
use crate::model::FittedPipeline;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Number(v)
    }
}

impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        FeatureValue::Flag(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Text(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        FeatureValue::Text(v)
    }
}

/// Flat name → value map, e.g. `{"driver": "VER", "lap_number": 14, ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionRequest {
    fields: BTreeMap<String, FeatureValue>,
}

impl PredictionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<FeatureValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<FeatureValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<FeatureValue> {
        self.fields.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.fields.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// The request a caller would send for an existing feature row.
    pub fn from_row(row: &FeatureRow) -> Self {
        let mut req = Self::new();
        for (name, value) in &row.numeric {
            req.insert(name, *value);
        }
        for (name, value) in &row.categorical {
            req.insert(name, value.as_str());
        }
        req
    }

    fn lookup(&self, name: &str) -> Result<&FeatureValue> {
        self.fields.get(name).ok_or_else(|| PipelineError::MissingFeature {
            feature: name.to_string(),
        })
    }
}

impl FeatureLookup for PredictionRequest {
    fn numeric_value(&self, name: &str) -> Result<f64> {
        match self.lookup(name)? {
            FeatureValue::Number(v) => Ok(*v),
            FeatureValue::Flag(b) => Ok(if *b { 1.0 } else { 0.0 }),
            FeatureValue::Text(s) => Err(PipelineError::InvalidFeature {
                feature: name.to_string(),
                reason: format!("expected a number, got {s:?}"),
            }),
        }
    }

    fn categorical_value(&self, name: &str) -> Result<&str> {
        match self.lookup(name)? {
            FeatureValue::Text(s) => Ok(s.as_str()),
            other => Err(PipelineError::InvalidFeature {
                feature: name.to_string(),
                reason: format!("expected a category string, got {other:?}"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub lap_time: f64,
    /// Request fields the pipeline does not know and ignored.
    pub warnings: Vec<String>,
}

/// Read-only view over a fitted pipeline; cheap to clone and share across
/// threads.
#[derive(Debug, Clone)]
pub struct PredictionService {
    pipeline: Arc<FittedPipeline>,
}

impl PredictionService {
    pub fn new(pipeline: Arc<FittedPipeline>) -> Self {
        Self { pipeline }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Arc::new(FittedPipeline::load(path)?)))
    }

    pub fn pipeline(&self) -> &FittedPipeline {
        &self.pipeline
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.pipeline.encoder().schema()
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<Prediction> {
        let schema = self.schema();
        let warnings: Vec<String> = request
            .names()
            .filter(|name| !schema.contains(name))
            .map(|name| {
                warn!(feature = name, "ignoring unknown request field");
                format!("ignored unknown feature {name}")
            })
            .collect();

        let encoded = self.pipeline.encoder().transform(request)?;
        let lap_time = self.pipeline.predict_encoded(encoded)?;
        Ok(Prediction { lap_time, warnings })
    }
}
