//! Core error types for habitlens-core.
//!
//! Data and configuration problems (`InsufficientData`, `InvalidConfiguration`,
//! `NotFound`) are recoverable by the caller. Anything that goes wrong inside
//! the numerics surfaces as `ModelingFailure` with its cause attached.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for habitlens-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Too few observations to assemble a dataset or train a model
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Unsupported algorithm, problem kind, or malformed input value
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A referenced habit is absent from the supplied set
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unexpected numeric failure while fitting, scoring or searching
    #[error("Modeling failure: {message}")]
    ModelingFailure {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Modeling failure without an underlying error value.
    pub fn modeling(message: impl Into<String>) -> Self {
        CoreError::ModelingFailure {
            message: message.into(),
            source: None,
        }
    }

    /// Modeling failure wrapping the error that caused it.
    pub fn modeling_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CoreError::ModelingFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether the caller can fix this by changing the input or the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::InsufficientData(_)
                | CoreError::InvalidConfiguration(_)
                | CoreError::NotFound(_)
                | CoreError::Config(_)
        )
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// A value that should have been finite was NaN or infinite.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("non-finite value {value} in {context}")]
pub struct NonFiniteError {
    pub context: String,
    pub value: f64,
}

/// Reject NaN and infinities so they never escape as an answer.
pub(crate) fn ensure_finite(value: f64, context: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoreError::modeling_with(
            format!("{context} is not a finite number"),
            NonFiniteError {
                context: context.to_string(),
                value,
            },
        ))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn data_problems_are_recoverable() {
        assert!(CoreError::InsufficientData("x".into()).is_recoverable());
        assert!(CoreError::InvalidConfiguration("x".into()).is_recoverable());
        assert!(CoreError::NotFound("x".into()).is_recoverable());
        assert!(!CoreError::modeling("boom").is_recoverable());
    }

    #[test]
    fn ensure_finite_keeps_cause() {
        assert_eq!(ensure_finite(1.5, "score").unwrap(), 1.5);

        let err = ensure_finite(f64::NAN, "score").unwrap_err();
        assert!(matches!(err, CoreError::ModelingFailure { .. }));
        let source = err.source().expect("cause preserved");
        assert!(source.to_string().contains("score"));
    }
}
