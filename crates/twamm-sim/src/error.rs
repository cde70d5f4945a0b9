//! Error types for the scenario simulator

use thiserror::Error;
use twamm_core::TwammError;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] TwammError),

    #[error("Step {step} ({action}) failed: {error}")]
    StepFailed {
        step: usize,
        action: String,
        error: TwammError,
    },
}

impl SimError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        SimError::InvalidConfig(reason.into())
    }
}

/// Result type for simulator operations
pub type SimResult<T> = Result<T, SimError>;
