use thiserror::Error;

/// Everything the pipeline can fail with. All variants are local to the
/// caller's input; none of them is worth retrying.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A lag or rolling window reaches further back than the driver's history
    /// and no fill policy is configured.
    #[error(
        "insufficient history for {driver} lap {lap} ({season} round {round}): \
         need {required} prior laps, have {available}"
    )]
    InsufficientHistory {
        driver: String,
        season: u16,
        round: u8,
        lap: u32,
        required: usize,
        available: usize,
    },

    /// The split would let a test race precede or coincide with a training race.
    #[error("split ordering violated: {0}")]
    SplitOrdering(String),

    /// A feature the encoder was fit with is absent from the input.
    #[error("missing feature: {feature}")]
    MissingFeature { feature: String },

    /// A feature is present but unusable (wrong kind or non-finite).
    #[error("invalid feature {feature}: {reason}")]
    InvalidFeature { feature: String, reason: String },

    #[error("evaluation set is empty")]
    EmptyEvaluationSet,

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("duplicate lap record: {driver} lap {lap} ({season} round {round})")]
    DuplicateLap {
        season: u16,
        round: u8,
        driver: String,
        lap: u32,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("model fit failed: {0}")]
    Fit(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Metrics(#[from] linfa::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
