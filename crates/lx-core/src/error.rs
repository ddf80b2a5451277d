//! Error types for lx-core

use thiserror::Error;

/// Main error type for lx-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Oracle API error: {0}")]
    OracleApi(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid field schema: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Record store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for lx-core
pub type Result<T> = std::result::Result<T, Error>;
