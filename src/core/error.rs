//! Error types for Leadrank

use thiserror::Error;

/// Result type alias using Leadrank's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the search engine.
///
/// Only validation and record-store failures come out of `search`; inference
/// and cache failures are recovered inside the engine (see [`InferenceError`]
/// and [`CacheError`]).
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Query error ({operation}): {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Search cancelled")]
    Cancelled,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn query(operation: &'static str, source: anyhow::Error) -> Self {
        Error::Query { operation, source }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Offending input field, for validation failures
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Error::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Inference failures. Never leave the scoring engine.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("inference timed out after {0}ms")]
    Timeout(u64),

    #[error("inference backend failed: {0}")]
    Backend(#[from] anyhow::Error),

    #[error("non-numeric inference response: {0:?}")]
    Malformed(String),

    #[error("inference score {0} outside 0..=100")]
    OutOfRange(i64),
}

/// Cache store failures. Degrade to miss / no-op.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache store failed: {0}")]
    Store(#[from] anyhow::Error),

    #[error("cache codec failed: {0}")]
    Codec(#[from] serde_json::Error),
}
