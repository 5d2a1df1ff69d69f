use std::path::PathBuf;
use thiserror::Error;

// Display strings are client-facing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field} must be a valid number")]
    InvalidNumber { field: &'static str },

    #[error("{field} must not be negative")]
    NegativeValue { field: &'static str, value: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("unseen {column} value: {value}")]
    UnseenCategory { column: &'static str, value: String },

    #[error("expected {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("malformed tree: {0}")]
    MalformedTree(String),

    #[error("classifier produced unknown label index {0}")]
    UnknownLabel(usize),

    #[error("non-finite {0} prediction")]
    NonFinite(&'static str),
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model is not trained")]
    NotTrained,

    #[error("failed to read model bundle {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt model bundle: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("invalid model bundle: {0}")]
    Invalid(String),

    #[error("prediction failed: {0}")]
    Prediction(#[from] PredictionError),
}

#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("training data is empty")]
    EmptyDataset,

    #[error("record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("failed to read training data {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse training data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to parse training CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("internal error: {0}")]
    Internal(String),
}
