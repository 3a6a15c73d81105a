//! Configuration management for lmtic
//!
//! Parses TOML configuration files and turns them into [`SessionOptions`].
//! Every section is optional, so an empty file is a valid configuration.

use crate::agent::{
    AgentSettings, DEFAULT_MAX_TOKENS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TEMPERATURE,
};
use crate::error::{LmError, LmResult};
use crate::models::Endpoint;
use crate::session::{DEFAULT_MODEL_NAME, SessionOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for a single endpoint probe, in seconds
pub const MAX_PROBE_TIMEOUT_SECS: u64 = 60;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    /// Candidate endpoints in probe order
    ///
    /// Absent means "use the built-in defaults"; an empty array means no
    /// candidates at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<Endpoint>>,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Explicit base URL; disables endpoint fallback when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            probe_timeout_seconds: default_probe_timeout(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

fn default_probe_timeout() -> u64 {
    2
}

/// Generation settings for the chat agent
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> LmResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: Read file (preserves io::Error context)
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            LmError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        // Phase 2: Parse TOML (preserves toml::de::Error context)
        let config: Self =
            toml::from_str(&content).map_err(|source| LmError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        // Phase 3: Validate parsed config
        config
            .validate()
            .map_err(|e| LmError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        tracing::debug!(path = %path.as_ref().display(), "Loaded configuration");
        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// Endpoint entries are already validated during deserialization; this
    /// covers the remaining cross-field and range checks.
    pub fn validate(&self) -> LmResult<()> {
        if self.session.model.trim().is_empty() {
            return Err(LmError::Config(
                "session.model must not be empty".to_string(),
            ));
        }

        if self.session.probe_timeout_seconds == 0
            || self.session.probe_timeout_seconds > MAX_PROBE_TIMEOUT_SECS
        {
            return Err(LmError::Config(format!(
                "session.probe_timeout_seconds must be between 1 and {}, got {}",
                MAX_PROBE_TIMEOUT_SECS, self.session.probe_timeout_seconds
            )));
        }

        if let Some(url) = &self.session.base_url {
            Endpoint::from_url(url)?;
            if self.endpoints.is_some() {
                tracing::warn!(
                    base_url = %url,
                    "session.base_url is set, [[endpoints]] will be ignored"
                );
            }
        }

        self.agent_settings()?;

        Ok(())
    }

    /// Validated agent settings from `[agent]`
    pub fn agent_settings(&self) -> LmResult<AgentSettings> {
        AgentSettings::new(
            self.agent.max_tokens,
            self.agent.temperature,
            self.agent.request_timeout_seconds,
        )
    }

    /// Session construction inputs described by this configuration
    pub fn session_options(&self) -> LmResult<SessionOptions> {
        Ok(SessionOptions {
            model_name: self.session.model.clone(),
            base_url: self.session.base_url.clone(),
            endpoints: self.endpoints.clone(),
            probe_timeout: Duration::from_secs(self.session.probe_timeout_seconds),
            agent: self.agent_settings()?,
        })
    }
}

impl FromStr for Config {
    type Err = LmError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| LmError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}
