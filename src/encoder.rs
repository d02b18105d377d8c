//! Categorical one-hot encoding and numeric scaling, fitted on the training
//! partition only.
//!
//! Encoded layout: every numeric column in schema order (scaled), followed by
//! one indicator block per categorical column. A block has one slot per value
//! seen in training, sorted; a value never seen in training leaves the whole
//! block at zero.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::features::{FeatureRow, FeatureSchema};
use crate::split::DatasetSplit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    /// (x - mean) / std
    #[default]
    Standard,
    /// (x - min) / (max - min)
    MinMax,
}

/// Read access to named feature values, shared by training rows and live
/// prediction requests.
pub trait FeatureLookup {
    fn numeric_value(&self, name: &str) -> Result<f64>;
    fn categorical_value(&self, name: &str) -> Result<&str>;
}

impl FeatureLookup for FeatureRow {
    fn numeric_value(&self, name: &str) -> Result<f64> {
        self.numeric(name).ok_or_else(|| PipelineError::MissingFeature {
            feature: name.to_string(),
        })
    }

    fn categorical_value(&self, name: &str) -> Result<&str> {
        self.categorical(name).ok_or_else(|| PipelineError::MissingFeature {
            feature: name.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub name: String,
    pub center: f64,
    pub spread: f64,
}

impl NumericStats {
    fn fit(name: &str, values: &[f64], scaling: Scaling) -> Self {
        let (center, spread) = match scaling {
            Scaling::Standard => {
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                (mean, var.sqrt())
            }
            Scaling::MinMax => {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (min, max - min)
            }
        };
        Self {
            name: name.to_string(),
            center,
            spread,
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        if self.spread == 0.0 {
            0.0
        } else {
            (value - self.center) / self.spread
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub name: String,
    // sorted, unique
    pub values: Vec<String>,
}

impl Vocabulary {
    fn slot(&self, value: &str) -> Option<usize> {
        self.values.binary_search_by(|v| v.as_str().cmp(value)).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedEncoder {
    schema: FeatureSchema,
    scaling: Scaling,
    numeric: Vec<NumericStats>,
    categorical: Vec<Vocabulary>,
}

fn finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PipelineError::InvalidFeature {
            feature: name.to_string(),
            reason: format!("value {value} is not finite"),
        })
    }
}

impl FittedEncoder {
    /// Fits on `split.train()`; the test side is never read.
    pub fn fit(schema: &FeatureSchema, scaling: Scaling, split: &DatasetSplit) -> Result<Self> {
        let rows = split.train();
        if rows.is_empty() {
            return Err(PipelineError::EmptyTrainingSet);
        }

        let mut numeric = Vec::with_capacity(schema.numeric.len());
        for name in &schema.numeric {
            let values = rows
                .iter()
                .map(|r| r.numeric_value(name).and_then(|v| finite(name, v)))
                .collect::<Result<Vec<f64>>>()?;
            numeric.push(NumericStats::fit(name, &values, scaling));
        }

        let mut categorical = Vec::with_capacity(schema.categorical.len());
        for name in &schema.categorical {
            let mut seen = BTreeSet::new();
            for row in rows {
                seen.insert(row.categorical_value(name)?.to_string());
            }
            categorical.push(Vocabulary {
                name: name.clone(),
                values: seen.into_iter().collect(),
            });
        }

        let encoder = Self {
            schema: schema.clone(),
            scaling,
            numeric,
            categorical,
        };
        debug!(rows = rows.len(), width = encoder.width(), "fitted encoder");
        Ok(encoder)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    pub fn numeric_stats(&self) -> &[NumericStats] {
        &self.numeric
    }

    pub fn vocabularies(&self) -> &[Vocabulary] {
        &self.categorical
    }

    pub fn width(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|v| v.values.len()).sum::<usize>()
    }

    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|s| s.name.clone()).collect();
        for vocab in &self.categorical {
            names.extend(vocab.values.iter().map(|v| format!("{}={v}", vocab.name)));
        }
        names
    }

    /// Encodes one input. Every schema column must be present; unknown
    /// categories encode as an all-zero block.
    pub fn transform<L: FeatureLookup + ?Sized>(&self, input: &L) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(self.width());
        for stats in &self.numeric {
            let value = finite(&stats.name, input.numeric_value(&stats.name)?)?;
            out.push(stats.apply(value));
        }
        for vocab in &self.categorical {
            let value = input.categorical_value(&vocab.name)?;
            let start = out.len();
            out.resize(start + vocab.values.len(), 0.0);
            if let Some(slot) = vocab.slot(value) {
                out[start + slot] = 1.0;
            }
        }
        Ok(out)
    }

    pub fn transform_rows<'a, I>(&self, rows: I) -> Result<Array2<f64>>
    where
        I: IntoIterator<Item = &'a FeatureRow>,
    {
        let mut flat = Vec::new();
        let mut n = 0;
        for row in rows {
            flat.extend(self.transform(row)?);
            n += 1;
        }
        Array2::from_shape_vec((n, self.width()), flat)
            .map_err(|e| PipelineError::Fit(format!("encoded matrix shape: {e}")))
    }
}
