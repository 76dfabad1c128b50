use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("insufficient data: need at least {required} prices, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("unsupported model type: {0}")]
    UnsupportedModel(String),

    #[error("simulation cancelled after {completed_paths} of {requested_paths} paths")]
    SimulationTimeout {
        completed_paths: usize,
        requested_paths: usize,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
