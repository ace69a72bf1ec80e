// src/error.rs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EcgError>;

#[derive(Debug, Error)]
pub enum EcgError {
    /// Rate estimation and beat segmentation both need two peaks.
    #[error("not enough peaks detected for analysis (found {found}, need at least 2)")]
    InsufficientPeaks { found: usize },

    /// Normalizing a constant signal would divide by zero.
    #[error("cannot normalize a constant signal (max == min)")]
    DivideByZero,

    #[error("network error: {0}")]
    Network(String),

    #[error("bad request: the server cannot process the request")]
    BadRequest,

    #[error("model inference failed: {0}")]
    ModelInference(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid input: {0}")]
    Input(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl EcgError {
    /// True for the kinds that count towards an acquisition failure episode.
    pub fn is_acquisition_failure(&self) -> bool {
        matches!(self, EcgError::Network(_) | EcgError::BadRequest)
    }
}
