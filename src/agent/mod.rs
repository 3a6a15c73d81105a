//! Chat-completion agents
//!
//! A session talks to its model through a [`StructuredAgent`]: given a prompt
//! and an [`OutputSchema`], the agent returns a list of JSON values that match
//! the schema. Agents are created by an [`AgentProvider`] from the resolved
//! model id and base URL, which keeps the session independent of the
//! backend and lets tests swap in a recording agent.

pub mod backend;
pub mod extract;

pub use backend::{OpenAgent, OpenAgentProvider};

use crate::error::{LmError, LmResult};
use crate::schema::OutputSchema;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Default generation limit
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default time allowed for one prompt, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
/// Upper bound for the prompt timeout, in seconds
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Errors raised by an agent while running a prompt
///
/// The session passes these through to the caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Failed to configure agent for model '{model}': {details}")]
    Options { model: String, details: String },

    #[error("Query to {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },

    #[error("Response stream from {endpoint} interrupted after {bytes_received} bytes: {message}")]
    Stream {
        endpoint: String,
        bytes_received: usize,
        message: String,
    },

    #[error("Model '{model}' did not answer within {timeout_seconds} seconds")]
    Timeout { model: String, timeout_seconds: u64 },

    #[error("Model '{model}' returned an empty response")]
    EmptyResponse { model: String },

    #[error("Model output is not a JSON list of records: {reason} (output starts with: {preview})")]
    MalformedOutput { reason: String, preview: String },

    #[error("Result item {index} does not match '{schema}': {reason}")]
    SchemaMismatch {
        schema: String,
        index: usize,
        reason: String,
    },
}

/// Runs prompts and returns schema-shaped results
#[async_trait]
pub trait StructuredAgent: Send + Sync {
    /// Run one prompt
    ///
    /// Each call is independent; no conversation history is kept.
    async fn run(&self, prompt: &str, schema: &OutputSchema) -> Result<Vec<Value>, AgentError>;
}

/// Creates agents bound to a model on an endpoint
///
/// Binding must not touch the network.
pub trait AgentProvider {
    type Agent: StructuredAgent;

    fn bind(&self, model_id: &str, base_url: &str) -> LmResult<Self::Agent>;
}

/// Generation settings applied to every prompt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSettings {
    max_tokens: u32,
    temperature: f32,
    request_timeout: Duration,
}

impl AgentSettings {
    /// Create validated settings
    ///
    /// # Errors
    /// `LmError::Config` if `max_tokens` is zero, `temperature` is outside
    /// `[0.0, 2.0]`, or the timeout is outside `(0, 300]` seconds.
    pub fn new(max_tokens: u32, temperature: f32, request_timeout_secs: u64) -> LmResult<Self> {
        if max_tokens == 0 {
            return Err(LmError::Config(
                "agent.max_tokens must be greater than 0".to_string(),
            ));
        }
        if !temperature.is_finite() || !(0.0..=2.0).contains(&temperature) {
            return Err(LmError::Config(format!(
                "agent.temperature must be a finite number between 0.0 and 2.0, got {}",
                temperature
            )));
        }
        if request_timeout_secs == 0 || request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            return Err(LmError::Config(format!(
                "agent.request_timeout_seconds must be between 1 and {}, got {}",
                MAX_REQUEST_TIMEOUT_SECS, request_timeout_secs
            )));
        }

        Ok(Self {
            max_tokens,
            temperature,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}
