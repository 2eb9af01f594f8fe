use thiserror::Error;

/// Errors raised while configuring or parsing scoring inputs.
///
/// Scoring functions themselves are total and never return this type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    #[error("Unknown rank metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown time window: {0}")]
    UnknownWindow(String),
}

pub type Result<T> = std::result::Result<T, ScoringError>;
