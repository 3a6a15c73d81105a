//! Client session
//!
//! [`LmSession`] ties together a resolved endpoint, the model selected on it,
//! and an agent bound to that pair. Construction is eager: endpoints are
//! probed and the model chosen before `connect` returns, so a session either
//! exists fully bound or not at all. Afterwards it is read-only.

use crate::agent::{AgentError, AgentProvider, AgentSettings, OpenAgentProvider, StructuredAgent};
use crate::error::{LmError, LmResult};
use crate::matcher::select_model;
use crate::models::{Endpoint, ModelInfo, ModelList};
use crate::resolver::{DEFAULT_PROBE_TIMEOUT, EndpointResolver};
use crate::schema::{OutputSchema, Structured};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Model requested when the caller does not name one
pub const DEFAULT_MODEL_NAME: &str = "qwen";

/// Inputs for session construction
///
/// `endpoints: None` means "use the built-in defaults", while
/// `Some(vec![])` really means zero candidates (and therefore fails).
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub model_name: String,
    pub base_url: Option<String>,
    pub endpoints: Option<Vec<Endpoint>>,
    pub probe_timeout: Duration,
    pub agent: AgentSettings,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            base_url: None,
            endpoints: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            agent: AgentSettings::default(),
        }
    }
}

impl SessionOptions {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Self::default()
        }
    }

    /// Use only this base URL, with no fallback candidates
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_endpoints(mut self, endpoints: Vec<Endpoint>) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_agent_settings(mut self, settings: AgentSettings) -> Self {
        self.agent = settings;
        self
    }

    /// Endpoints to probe, in order
    ///
    /// An explicit base URL wins over any list; otherwise the caller's list
    /// is used verbatim, or the defaults when no list was given.
    ///
    /// # Errors
    /// `LmError::Validation` if the explicit URL is malformed.
    pub fn candidates(&self) -> LmResult<Vec<Endpoint>> {
        if let Some(url) = &self.base_url {
            return Ok(vec![Endpoint::from_url(url)?]);
        }
        Ok(match &self.endpoints {
            Some(list) => list.clone(),
            None => Endpoint::defaults(),
        })
    }
}

/// A resolved endpoint, a selected model, and an agent bound to both
#[derive(Debug)]
pub struct LmSession<A = crate::agent::OpenAgent> {
    endpoint: Endpoint,
    models: ModelList,
    model: ModelInfo,
    agent: A,
}

impl LmSession {
    /// Resolve an endpoint and bind the default `open-agent-sdk` agent
    ///
    /// # Errors
    /// - `LmError::Validation` for a malformed explicit URL
    /// - `LmError::NoWorkingEndpoint` if no candidate lists any model
    pub async fn connect(options: SessionOptions) -> LmResult<Self> {
        let provider = OpenAgentProvider::new(options.agent);
        Self::connect_with(options, &provider).await
    }
}

impl<A: StructuredAgent> LmSession<A> {
    /// Resolve an endpoint and bind an agent from `provider`
    pub async fn connect_with<P>(options: SessionOptions, provider: &P) -> LmResult<Self>
    where
        P: AgentProvider<Agent = A>,
    {
        let candidates = options.candidates()?;
        tracing::debug!(
            requested_model = %options.model_name,
            candidates = candidates.len(),
            probe_timeout_ms = options.probe_timeout.as_millis() as u64,
            "Resolving endpoint"
        );

        let resolver = EndpointResolver::new(candidates, options.probe_timeout)?;
        let (endpoint, models) = resolver.resolve().await?.into_parts();

        let model = select_model(&models.data, &options.model_name)
            .cloned()
            .ok_or_else(|| LmError::Internal("resolved endpoint has no models".to_string()))?;

        let base_url = endpoint.url();
        let agent = provider.bind(&model.id, &base_url)?;

        tracing::info!(
            endpoint_name = %endpoint.name(),
            base_url = %base_url,
            requested_model = %options.model_name,
            model_id = %model.id,
            "Session ready"
        );

        Ok(Self {
            endpoint,
            models,
            model,
            agent,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Base URL the agent talks to
    pub fn base_url(&self) -> String {
        self.endpoint.url()
    }

    pub fn model(&self) -> &ModelInfo {
        &self.model
    }

    /// Everything the endpoint advertised during probing
    pub fn models(&self) -> &ModelList {
        &self.models
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// Run a prompt and return its results as `T`
    ///
    /// # Errors
    /// - `LmError::InvalidSchema` if `T::schema()` is not a usable record
    ///   (checked before anything is sent)
    /// - `LmError::Agent` with the agent's error, unchanged
    pub async fn run_prompt<T: Structured>(&self, prompt: &str) -> LmResult<Vec<T>> {
        let schema = T::schema();
        let values = self.run_prompt_with_schema(prompt, &schema).await?;

        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value(value).map_err(|e| {
                    LmError::Agent(AgentError::SchemaMismatch {
                        schema: schema.name().to_string(),
                        index,
                        reason: e.to_string(),
                    })
                })
            })
            .collect()
    }

    /// Run a prompt against a schema known only at runtime
    pub async fn run_prompt_with_schema(
        &self,
        prompt: &str,
        schema: &OutputSchema,
    ) -> LmResult<Vec<Value>> {
        schema.validate()?;

        let prompt_id = Uuid::new_v4();
        tracing::debug!(
            prompt_id = %prompt_id,
            model_id = %self.model.id,
            schema = %schema.name(),
            prompt_length = prompt.len(),
            "Running prompt"
        );

        let results = self.agent.run(prompt, schema).await.map_err(|e| {
            tracing::warn!(
                prompt_id = %prompt_id,
                model_id = %self.model.id,
                error = %e,
                "Prompt failed"
            );
            LmError::Agent(e)
        })?;

        tracing::debug!(
            prompt_id = %prompt_id,
            result_count = results.len(),
            "Prompt completed"
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = SessionOptions::default();
        assert_eq!(options.model_name, "qwen");
        assert!(options.base_url.is_none());
        assert!(options.endpoints.is_none());
        assert_eq!(options.probe_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_candidates_fall_back_to_defaults() {
        let candidates = SessionOptions::default().candidates().unwrap();
        assert_eq!(candidates, Endpoint::defaults());
    }

    #[test]
    fn test_explicit_url_replaces_candidates() {
        let extra = Endpoint::from_url("http://10.0.0.2:8080/v1").unwrap();
        let options = SessionOptions::new("llama")
            .with_endpoints(vec![extra])
            .with_base_url("localhost:1234");
        let candidates = options.candidates().unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url(), "http://localhost:1234/v1");
    }

    #[test]
    fn test_empty_list_stays_empty() {
        let options = SessionOptions::default().with_endpoints(Vec::new());
        assert!(options.candidates().unwrap().is_empty());
    }

    #[test]
    fn test_bad_explicit_url_is_a_validation_error() {
        let options = SessionOptions::default().with_base_url("gopher://localhost");
        assert!(options.candidates().unwrap_err().is_validation());
    }

    #[test]
    fn test_connect_without_candidates_fails_before_binding() {
        let options = SessionOptions::default().with_endpoints(Vec::new());
        match tokio_test::block_on(LmSession::connect(options)) {
            Err(LmError::NoWorkingEndpoint { attempted, failures }) => {
                assert_eq!(attempted, 0);
                assert!(failures.is_empty());
            }
            other => panic!("expected NoWorkingEndpoint, got {:?}", other.map(|s| s.base_url())),
        }
    }

    #[test]
    fn test_connect_rejects_bad_url_without_probing() {
        let options = SessionOptions::default().with_base_url("ftp://localhost:21");
        let err = tokio_test::block_on(LmSession::connect(options)).unwrap_err();
        assert!(err.is_validation());
    }
}
