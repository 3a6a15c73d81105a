//! Endpoint discovery
//!
//! Probes candidate endpoints one at a time with `GET {base}/models` and keeps
//! the first that answers with a non-empty model list. A failed probe is
//! logged and the next candidate is tried; only when every candidate has
//! failed does resolution return an error.

use crate::error::{LmError, LmResult};
use crate::models::{Endpoint, ModelList};
use std::time::Duration;

/// Per-probe timeout used when the caller does not pick one
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Why a single candidate could not be used
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u128 },

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("malformed model list: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("endpoint advertises no models")]
    NoModels,
}

/// Result of a successful resolution
///
/// `models` is never empty.
#[derive(Debug, Clone)]
pub struct ResolvedEndpoint {
    endpoint: Endpoint,
    models: ModelList,
}

impl ResolvedEndpoint {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn models(&self) -> &ModelList {
        &self.models
    }

    pub fn into_parts(self) -> (Endpoint, ModelList) {
        (self.endpoint, self.models)
    }
}

/// Ordered endpoint prober
pub struct EndpointResolver {
    candidates: Vec<Endpoint>,
    probe_timeout: Duration,
    client: reqwest::Client,
}

impl EndpointResolver {
    /// Create a resolver over `candidates`, tried in the given order
    ///
    /// # Errors
    /// `LmError::Internal` if the HTTP client cannot be built.
    pub fn new(candidates: Vec<Endpoint>, probe_timeout: Duration) -> LmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(probe_timeout)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to create HTTP client for endpoint probing");
                LmError::Internal(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            candidates,
            probe_timeout,
            client,
        })
    }

    pub fn candidates(&self) -> &[Endpoint] {
        &self.candidates
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// List the models of a single endpoint
    ///
    /// An answer with zero models counts as a failure.
    pub async fn probe(&self, endpoint: &Endpoint) -> Result<ModelList, ProbeError> {
        let url = endpoint.models_url();

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout {
                    timeout_ms: self.probe_timeout.as_millis(),
                }
            } else {
                ProbeError::Transport(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout {
                    timeout_ms: self.probe_timeout.as_millis(),
                }
            } else {
                ProbeError::Transport(e)
            }
        })?;

        let models: ModelList = serde_json::from_str(&body).map_err(ProbeError::Malformed)?;
        if models.is_empty() {
            return Err(ProbeError::NoModels);
        }

        tracing::debug!(
            endpoint_name = %endpoint.name(),
            url = %url,
            status = %status,
            model_count = models.len(),
            "Probe succeeded"
        );

        Ok(models)
    }

    /// Find the first candidate with a non-empty model list
    ///
    /// Candidates are probed sequentially, each exactly once, and iteration
    /// stops at the first success.
    ///
    /// # Errors
    /// `LmError::NoWorkingEndpoint` when no candidate (possibly none at all)
    /// produced a usable model list.
    pub async fn resolve(&self) -> LmResult<ResolvedEndpoint> {
        let mut failures = Vec::with_capacity(self.candidates.len());

        for (index, endpoint) in self.candidates.iter().enumerate() {
            tracing::debug!(
                endpoint_name = %endpoint.name(),
                endpoint_url = %endpoint.url(),
                attempt = index + 1,
                candidates = self.candidates.len(),
                "Probing endpoint"
            );

            match self.probe(endpoint).await {
                Ok(models) => {
                    tracing::info!(
                        endpoint_name = %endpoint.name(),
                        endpoint_url = %endpoint.url(),
                        model_count = models.len(),
                        "Using endpoint"
                    );
                    return Ok(ResolvedEndpoint {
                        endpoint: endpoint.clone(),
                        models,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        endpoint_name = %endpoint.name(),
                        endpoint_url = %endpoint.url(),
                        error = %e,
                        "Endpoint probe failed, trying next candidate"
                    );
                    failures.push(format!("{}: {}", endpoint, e));
                }
            }
        }

        tracing::error!(
            attempted = self.candidates.len(),
            "No candidate endpoint returned any models"
        );

        Err(LmError::NoWorkingEndpoint {
            attempted: self.candidates.len(),
            failures,
        })
    }
}
