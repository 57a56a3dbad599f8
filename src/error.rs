//! Error types for the imessage-wrapped-rust library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the application.

use thiserror::Error;

/// Errors that can occur in the imessage-wrapped-rust application.
#[derive(Error, Debug)]
pub enum WrappedError {
    /// Invalid configuration value, raised at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unsupported sentiment period interval
    #[error("Unsupported sentiment interval: {0} (expected one of: day, week, month)")]
    InvalidInterval(String),

    /// A sentiment backend could not be initialized
    #[error("Sentiment backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Subword tokenizer failure
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Model inference failure
    #[error("Inference error: {0}")]
    Inference(String),

    /// Export data violates a structural invariant
    #[error("Invalid export: {0}")]
    InvalidExport(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML rendering errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with `WrappedError`
pub type Result<T> = std::result::Result<T, WrappedError>;

impl From<anyhow::Error> for WrappedError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<rust_tokenizers::error::TokenizerError> for WrappedError {
    fn from(err: rust_tokenizers::error::TokenizerError) -> Self {
        Self::Tokenizer(err.to_string())
    }
}
