use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model error: {0}")]
    ModelError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("normalization error: {0}")]
    NormalizationError(String),

    #[error("technique unavailable: {0}")]
    TechniqueUnavailable(String),

    #[error("all forecasting techniques failed: {0}")]
    AllTechniquesFailed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SalesError>;
