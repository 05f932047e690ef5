//! Error types for the traffic-forecast library.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while loading, testing, fitting or forecasting a series.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Non-monotonic, duplicate or otherwise invalid month stamps.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The model could not be estimated (optimizer failure or degenerate input).
    #[error("model fit failed: {0}")]
    ModelFit(String),

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Menu label or slug that does not name a dashboard page.
    #[error("unknown page: {0}")]
    UnknownPage(String),

    /// The external data source failed to produce a series.
    #[error("data source error: {0}")]
    DataSource(String),

    /// Dashboard configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for ForecastError {
    fn from(err: config::ConfigError) -> Self {
        ForecastError::Config(err.to_string())
    }
}
