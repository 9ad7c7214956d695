use thiserror::Error;

/// Errors surfaced by the histboost library. Every failure is fatal to the
/// operation that produced it; nothing is retried internally.
#[derive(Debug, Error)]
pub enum HistBoostError {
    #[error("Invalid value passed for {0}, expected {1} but {2} provided.")]
    InvalidConfiguration(String, String, String),
    #[error("The dataset has zero {0}.")]
    EmptyDataset(String),
    #[error("Training was invoked on a matrix without labels.")]
    MissingLabels,
    #[error("Inconsistent shape: {0}")]
    InconsistentShape(String),
    #[error("Unable to parse value {value:?} in {file} at row {row}, column {column}.")]
    ParseError {
        file: String,
        row: usize,
        column: usize,
        value: String,
    },
    #[error("Unable to access {0}: {1}")]
    IoError(String, String),
    #[error("Invalid model format: {0}")]
    FormatError(String),
    #[error("Prediction was requested from an untrained model.")]
    UntrainedModel,
}

impl HistBoostError {
    /// Shorthand used by the configuration validators.
    pub(crate) fn invalid_parameter(parameter: &str, expected: &str, passed: impl ToString) -> Self {
        HistBoostError::InvalidConfiguration(parameter.to_string(), expected.to_string(), passed.to_string())
    }
}
