//! Agent backed by `open-agent-sdk`
//!
//! Sends the prompt, followed by output instructions carrying the JSON Schema
//! of the requested list, to an OpenAI-compatible endpoint and turns the
//! streamed text into schema-checked JSON values.

use super::extract::extract_items;
use super::{AgentError, AgentProvider, AgentSettings, StructuredAgent};
use crate::error::LmResult;
use crate::schema::OutputSchema;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;

/// Creates [`OpenAgent`]s with shared generation settings
#[derive(Debug, Clone, Default)]
pub struct OpenAgentProvider {
    settings: AgentSettings,
}

impl OpenAgentProvider {
    pub fn new(settings: AgentSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }
}

impl AgentProvider for OpenAgentProvider {
    type Agent = OpenAgent;

    fn bind(&self, model_id: &str, base_url: &str) -> LmResult<OpenAgent> {
        let agent = OpenAgent {
            model: model_id.to_string(),
            base_url: base_url.to_string(),
            settings: self.settings,
        };

        // Catch option errors at session construction rather than first prompt
        agent.options()?;

        tracing::debug!(
            model_id = %model_id,
            base_url = %base_url,
            max_tokens = self.settings.max_tokens(),
            temperature = self.settings.temperature(),
            "Bound chat agent"
        );

        Ok(agent)
    }
}

/// Structured-output agent for one model on one endpoint
#[derive(Debug, Clone)]
pub struct OpenAgent {
    model: String,
    base_url: String,
    settings: AgentSettings,
}

impl OpenAgent {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn options(&self) -> Result<open_agent::AgentOptions, AgentError> {
        open_agent::AgentOptions::builder()
            .model(&self.model)
            .base_url(&self.base_url)
            .max_tokens(self.settings.max_tokens())
            .temperature(self.settings.temperature())
            .build()
            .map_err(|e| {
                tracing::error!(
                    model_id = %self.model,
                    base_url = %self.base_url,
                    error = %e,
                    "Failed to build AgentOptions"
                );
                AgentError::Options {
                    model: self.model.clone(),
                    details: e.to_string(),
                }
            })
    }

    /// Stream the completion and concatenate its text blocks
    async fn collect_text(
        &self,
        prompt: &str,
        options: &open_agent::AgentOptions,
    ) -> Result<String, AgentError> {
        let mut stream = open_agent::query(prompt, options).await.map_err(|e| {
            tracing::error!(
                model_id = %self.model,
                base_url = %self.base_url,
                error = %e,
                "Failed to start model query"
            );
            AgentError::Connection {
                endpoint: self.base_url.clone(),
                message: e.to_string(),
            }
        })?;

        let mut text = String::new();
        while let Some(result) = stream.next().await {
            match result {
                Ok(open_agent::ContentBlock::Text(block)) => text.push_str(&block.text),
                Ok(other) => {
                    tracing::debug!(
                        model_id = %self.model,
                        block_type = ?other,
                        "Skipping non-text content block"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        model_id = %self.model,
                        base_url = %self.base_url,
                        error = %e,
                        partial_response_length = text.len(),
                        "Response stream interrupted"
                    );
                    return Err(AgentError::Stream {
                        endpoint: self.base_url.clone(),
                        bytes_received: text.len(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(text)
    }
}

/// Prompt text followed by output instructions for `schema`
pub fn structured_prompt(prompt: &str, schema: &OutputSchema) -> String {
    format!(
        "{}\n\n\
         Respond only with a JSON array of '{}' objects that validates against this JSON Schema:\n\
         {}\n\
         Do not add explanations or any text outside the JSON array.",
        prompt.trim_end(),
        schema.name(),
        schema.to_json_schema()
    )
}

#[async_trait]
impl StructuredAgent for OpenAgent {
    async fn run(&self, prompt: &str, schema: &OutputSchema) -> Result<Vec<Value>, AgentError> {
        let options = self.options()?;
        let full_prompt = structured_prompt(prompt, schema);
        let timeout = self.settings.request_timeout();

        tracing::debug!(
            model_id = %self.model,
            schema = %schema.name(),
            prompt_length = full_prompt.len(),
            timeout_seconds = timeout.as_secs(),
            "Starting structured query"
        );

        let text = tokio::time::timeout(timeout, self.collect_text(&full_prompt, &options))
            .await
            .map_err(|_elapsed| {
                tracing::error!(
                    model_id = %self.model,
                    base_url = %self.base_url,
                    timeout_seconds = timeout.as_secs(),
                    "Model query timed out"
                );
                AgentError::Timeout {
                    model: self.model.clone(),
                    timeout_seconds: timeout.as_secs(),
                }
            })??;

        if text.trim().is_empty() {
            return Err(AgentError::EmptyResponse {
                model: self.model.clone(),
            });
        }

        let items = extract_items(&text)?;
        for (index, item) in items.iter().enumerate() {
            schema
                .check(item)
                .map_err(|reason| AgentError::SchemaMismatch {
                    schema: schema.name().to_string(),
                    index,
                    reason,
                })?;
        }

        tracing::info!(
            model_id = %self.model,
            schema = %schema.name(),
            result_count = items.len(),
            response_length = text.len(),
            "Structured query completed"
        );

        Ok(items)
    }
}
