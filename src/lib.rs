//! Next-lap-time forecasting from per-lap Formula 1 records.
//!
//! Stages run strictly in order and each one takes and returns plain values:
//! lap records → [`features::build_feature_table`] → [`split::split`] →
//! [`model::Trainer::fit`] (encoder fit on the training side only) →
//! [`predict::PredictionService`].

pub mod config;
pub mod data;
pub mod degradation;
pub mod encoder;
pub mod error;
pub mod features;
pub mod model;
pub mod predict;
pub mod server;
pub mod split;
pub mod summary;

pub use config::PipelineConfig;
pub use data::{CsvLapSource, LapRecord, RaceKey, SessionRecords};
pub use error::{PipelineError, Result};
pub use features::{build_feature_table, FeatureConfig, FeatureRow, FillPolicy};
pub use model::{FittedPipeline, Metrics, Trainer};
pub use predict::{Prediction, PredictionRequest, PredictionService};
pub use split::{split, DatasetSplit, SplitBoundary};
