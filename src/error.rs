//! Error types for lmtic
//!
//! `LmError` is the single error surfaced by the public API. Probe failures
//! are recovered inside the resolver and only show up here, aggregated, when
//! every candidate has failed.

use crate::agent::AgentError;
use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum LmError {
    /// An endpoint field (or an explicit base URL) is malformed
    #[error("Invalid endpoint {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// No candidate endpoint answered with a non-empty model list
    #[error(
        "No working endpoint found after trying {attempted} candidate(s){}",
        format_failures(.failures)
    )]
    NoWorkingEndpoint {
        attempted: usize,
        failures: Vec<String>,
    },

    /// The requested output shape is not a usable record schema
    #[error("Output type '{schema}' is not a valid structured schema: {reason}")]
    InvalidSchema { schema: String, reason: String },

    /// Failure reported by the chat-completion agent, passed through as is
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_failures(failures: &[String]) -> String {
    if failures.is_empty() {
        String::new()
    } else {
        format!(": {}", failures.join("; "))
    }
}

impl LmError {
    /// Shorthand for a validation failure on a named field
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Returns true for errors raised before any network activity
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::InvalidSchema { .. })
    }
}

/// Convenience type alias for Results
pub type LmResult<T> = Result<T, LmError>;
