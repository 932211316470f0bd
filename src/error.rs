//! Error types for AkashMover

use thiserror::Error;

/// AkashMover error type
#[derive(Error, Debug)]
pub enum MoverError {
    #[error("Connection failed: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Startup failed: {0}")]
    Startup(String),
}

impl From<serde_json::Error> for MoverError {
    fn from(e: serde_json::Error) -> Self {
        MoverError::Protocol(e.to_string())
    }
}

impl From<toml::de::Error> for MoverError {
    fn from(e: toml::de::Error) -> Self {
        MoverError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MoverError>;
