use gbdt::config::Config as BoosterConfig;
use gbdt::decision_tree::{Data, DataVec, ValueType};
use gbdt::gradient_boost::GBDT;
use linfa::prelude::SingleTargetRegression;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::config::{IngestConfig, PipelineConfig};
use crate::data::RaceKey;
use crate::encoder::{FittedEncoder, Scaling};
use crate::error::{PipelineError, Result};
use crate::features::{FeatureConfig, FeatureRow, TARGET};
use crate::split::{self, DatasetSplit};

/// Gradient-boosted regression tree settings. Row and feature subsampling are
/// fixed at 1.0 so a fit is a pure function of its training matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub iterations: usize,
    pub max_depth: u32,
    pub shrinkage: f32,
    pub min_leaf_size: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            iterations: 200,
            max_depth: 5,
            shrinkage: 0.1,
            min_leaf_size: 3,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    booster: GBDT,
    features: usize,
}

impl std::fmt::Debug for GradientBoostedTrees {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradientBoostedTrees")
            .field("features", &self.features)
            .finish_non_exhaustive()
    }
}

fn to_values(row: ArrayView1<f64>) -> Vec<ValueType> {
    row.iter().map(|&v| v as ValueType).collect()
}

impl GradientBoostedTrees {
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, cfg: &ModelConfig) -> Self {
        let features = x.ncols();
        let mut conf = BoosterConfig::new();
        conf.set_feature_size(features);
        conf.set_max_depth(cfg.max_depth);
        conf.set_iterations(cfg.iterations);
        conf.set_shrinkage(cfg.shrinkage);
        conf.set_min_leaf_size(cfg.min_leaf_size);
        conf.set_loss("SquaredError");
        conf.set_data_sample_ratio(1.0);
        conf.set_feature_sample_ratio(1.0);
        conf.set_debug(false);

        let mut train: DataVec = x
            .rows()
            .into_iter()
            .zip(y.iter())
            .map(|(row, &target)| Data::new_training_data(to_values(row), 1.0, target as ValueType, None))
            .collect();

        let mut booster = GBDT::new(&conf);
        booster.fit(&mut train);
        Self { booster, features }
    }

    pub fn features(&self) -> usize {
        self.features
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.features {
            return Err(PipelineError::InvalidFeature {
                feature: "encoded vector".into(),
                reason: format!("width {} does not match model width {}", x.ncols(), self.features),
            });
        }
        let batch: DataVec = x
            .rows()
            .into_iter()
            .map(|row| Data::new_test_data(to_values(row), None))
            .collect();
        Ok(self.booster.predict(&batch).into_iter().map(f64::from).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub samples: usize,
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    /// Percent, over non-zero targets. `None` when every target is zero.
    pub mape: Option<f64>,
}

impl Metrics {
    pub fn compute(predictions: &Array1<f64>, targets: &Array1<f64>) -> Result<Self> {
        if targets.is_empty() {
            return Err(PipelineError::EmptyEvaluationSet);
        }
        let mae = predictions.mean_absolute_error(targets)?;
        let mse = predictions.mean_squared_error(targets)?;
        let r2 = predictions.r2(targets)?;
        let relative: Vec<f64> = predictions
            .iter()
            .zip(targets.iter())
            .filter(|(_, t)| **t != 0.0)
            .map(|(p, t)| ((t - p) / t).abs())
            .collect();
        let mape = (!relative.is_empty())
            .then(|| relative.iter().sum::<f64>() / relative.len() as f64 * 100.0);
        Ok(Self {
            samples: targets.len(),
            mae,
            rmse: mse.sqrt(),
            r2,
            mape,
        })
    }
}

/// Everything needed to turn a feature input into a lap-time estimate.
/// Immutable once produced by [`Trainer::fit`].
#[derive(Debug, Serialize, Deserialize)]
pub struct FittedPipeline {
    #[serde(default)]
    ingest: IngestConfig,
    features: FeatureConfig,
    encoder: FittedEncoder,
    model: GradientBoostedTrees,
    target: String,
    trained_on: Vec<RaceKey>,
    metrics: Option<Metrics>,
}

impl FittedPipeline {
    // laps to evaluate against this pipeline must be read with the same filter
    pub fn ingest(&self) -> &IngestConfig {
        &self.ingest
    }

    pub fn features(&self) -> &FeatureConfig {
        &self.features
    }

    pub fn encoder(&self) -> &FittedEncoder {
        &self.encoder
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn trained_on(&self) -> &[RaceKey] {
        &self.trained_on
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn predict_rows(&self, rows: &[FeatureRow]) -> Result<Array1<f64>> {
        let x = self.encoder.transform_rows(rows)?;
        self.model.predict(&x)
    }

    pub fn predict_encoded(&self, encoded: Vec<f64>) -> Result<f64> {
        let width = encoded.len();
        let x = Array2::from_shape_vec((1, width), encoded)
            .map_err(|e| PipelineError::Fit(format!("encoded vector shape: {e}")))?;
        Ok(self.model.predict(&x)?[0])
    }

    /// Scores the rows of `rows` that have a target with the frozen encoder
    /// and model.
    pub fn evaluate(&self, rows: &[FeatureRow]) -> Result<Metrics> {
        let (labelled, targets) = labelled(rows);
        if labelled.is_empty() {
            return Err(PipelineError::EmptyEvaluationSet);
        }
        let x = self.encoder.transform_rows(labelled)?;
        let predictions = self.model.predict(&x)?;
        Metrics::compute(&predictions, &targets)
    }

    /// Scores the test side of a split made after training, refusing any
    /// test race that is not later than every race the model was fit on.
    pub fn evaluate_split(&self, split: &DatasetSplit) -> Result<Metrics> {
        if let (Some(last_trained), Some(first_test)) =
            (self.trained_on.iter().max(), split.test_races().first())
        {
            if first_test <= last_trained {
                return Err(PipelineError::SplitOrdering(format!(
                    "test race {first_test} is not after training race {last_trained}"
                )));
            }
        }
        self.evaluate(split.test())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path.as_ref(), serde_json::to_string(self)?)?;
        info!(path = %path.as_ref().display(), "saved fitted pipeline");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;
        let pipeline: FittedPipeline = serde_json::from_str(&data)?;
        info!(
            path = %path.as_ref().display(),
            width = pipeline.encoder.width(),
            "loaded fitted pipeline"
        );
        Ok(pipeline)
    }
}

fn labelled(rows: &[FeatureRow]) -> (Vec<&FeatureRow>, Array1<f64>) {
    let (rows, targets): (Vec<&FeatureRow>, Vec<f64>) = rows
        .iter()
        .filter_map(|r| r.target.map(|t| (r, t)))
        .unzip();
    (rows, Array1::from(targets))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceEvaluation {
    pub race: RaceKey,
    pub train_rows: usize,
    pub metrics: Metrics,
}

pub struct Trainer {
    ingest: IngestConfig,
    features: FeatureConfig,
    scaling: Scaling,
    model: ModelConfig,
}

impl Trainer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            ingest: config.ingest.clone(),
            features: config.features.clone(),
            scaling: config.scaling,
            model: config.model.clone(),
        }
    }

    /// Fits encoder and model on the training side of `split`. The encoder
    /// sees every training row; the model only those with a target.
    pub fn fit(&self, split: &DatasetSplit) -> Result<FittedPipeline> {
        let schema = self.features.schema();
        let encoder = FittedEncoder::fit(&schema, self.scaling, split)?;
        let (rows, y) = labelled(split.train());
        if rows.is_empty() {
            return Err(PipelineError::EmptyTrainingSet);
        }
        let x = encoder.transform_rows(rows)?;

        debug!(rows = x.nrows(), cols = x.ncols(), "fitting gradient boosted trees");
        let model = GradientBoostedTrees::fit(&x, &y, &self.model);
        info!(
            rows = x.nrows(),
            width = x.ncols(),
            races = split.train_races().len(),
            "trained lap time model"
        );

        Ok(FittedPipeline {
            ingest: self.ingest.clone(),
            features: self.features.clone(),
            encoder,
            model,
            target: TARGET.to_string(),
            trained_on: split.train_races().to_vec(),
            metrics: None,
        })
    }

    pub fn fit_and_evaluate(&self, split: &DatasetSplit) -> Result<FittedPipeline> {
        let pipeline = self.fit(split)?;
        let metrics = pipeline.evaluate(split.test())?;
        info!(
            samples = metrics.samples,
            mae = metrics.mae,
            rmse = metrics.rmse,
            r2 = metrics.r2,
            "evaluated on held-out races"
        );
        Ok(pipeline.with_metrics(metrics))
    }

    /// Expanding-window evaluation, one held-out race at a time.
    pub fn walk_forward(&self, rows: &[FeatureRow], min_train_races: usize) -> Result<Vec<RaceEvaluation>> {
        let mut results = Vec::new();
        for s in split::walk_forward(rows, min_train_races)? {
            let pipeline = self.fit(&s)?;
            let metrics = pipeline.evaluate(s.test())?;
            let race = s.test_races()[0];
            debug!(%race, mae = metrics.mae, "walk-forward fold");
            results.push(RaceEvaluation {
                race,
                train_rows: s.train().len(),
                metrics,
            });
        }
        Ok(results)
    }
}
