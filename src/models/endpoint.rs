//! Validated endpoint locations
//!
//! An `Endpoint` is a fully specified network location (protocol, host, port,
//! path) that is believed to host an OpenAI-compatible model server. All
//! fields are checked at construction and are private afterwards, so a value
//! of this type is always valid.

use crate::error::{LmError, LmResult};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Path used when an explicit URL does not carry one
pub const DEFAULT_PATH: &str = "/v1";

/// Name given to the synthetic endpoint built from an explicit base URL
pub const EXPLICIT_ENDPOINT_NAME: &str = "explicit";

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// URL scheme of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }

    /// Port implied by the scheme when none is given
    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Http => 80,
            Protocol::Https => 443,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = LmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(LmError::validation(
                "protocol",
                format!("expected 'http' or 'https', got '{}'", other),
            )),
        }
    }
}

/// A candidate model-serving location
///
/// Construct with [`Endpoint::new`], [`Endpoint::from_url`], or by
/// deserializing a config entry; every path goes through the same validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawEndpoint")]
pub struct Endpoint {
    name: String,
    protocol: Protocol,
    host: String,
    port: u16,
    path: String,
}

impl Endpoint {
    /// Create a validated endpoint
    ///
    /// `port` is taken as `u32` so that out-of-range values reach validation
    /// instead of being truncated by the caller.
    ///
    /// # Errors
    /// Returns `LmError::Validation` naming the first malformed field.
    pub fn new(
        name: impl Into<String>,
        protocol: Protocol,
        host: impl Into<String>,
        port: u32,
        path: impl Into<String>,
    ) -> LmResult<Self> {
        let name = name.into();
        let host = host.into();
        let path = path.into();

        if name.trim().is_empty() {
            return Err(LmError::validation("name", "must not be empty"));
        }

        validate_host(&host).map_err(|reason| LmError::validation("host", reason))?;

        let port = u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| {
                LmError::validation("port", format!("must be between 1 and 65535, got {}", port))
            })?;

        if !path.starts_with('/') {
            return Err(LmError::validation(
                "path",
                format!("must start with '/', got '{}'", path),
            ));
        }

        Ok(Self {
            name,
            protocol,
            host,
            port,
            path,
        })
    }

    /// Build the synthetic endpoint for an explicit base URL
    ///
    /// Missing pieces are filled in: scheme defaults to `http`, port to the
    /// scheme's default, and an empty or bare `/` path to `/v1`. URLs with
    /// credentials, a query or a fragment are rejected, since an `Endpoint`
    /// has nowhere to keep them.
    pub fn from_url(raw: &str) -> LmResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LmError::validation("url", "must not be empty"));
        }

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };

        let url = Url::parse(&with_scheme)
            .map_err(|e| LmError::validation("url", format!("cannot parse '{}': {}", raw, e)))?;

        if !url.username().is_empty() || url.password().is_some() {
            return Err(LmError::validation(
                "url",
                "must not carry credentials; configure the server without them",
            ));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(LmError::validation(
                "url",
                format!("'{}' must not carry a query or fragment", raw),
            ));
        }

        let protocol: Protocol = url.scheme().parse()?;
        let host = url
            .host_str()
            .ok_or_else(|| LmError::validation("url", format!("'{}' has no host", raw)))?;
        let port = url.port().unwrap_or_else(|| protocol.default_port());
        let path = match url.path() {
            "" | "/" => DEFAULT_PATH,
            other => other,
        };

        Self::new(EXPLICIT_ENDPOINT_NAME, protocol, host, u32::from(port), path)
    }

    /// The two local servers tried when the caller names no candidates
    pub fn defaults() -> Vec<Endpoint> {
        vec![
            Self {
                name: "lmstudio".to_string(),
                protocol: Protocol::Http,
                host: "localhost".to_string(),
                port: 1234,
                path: DEFAULT_PATH.to_string(),
            },
            Self {
                name: "ollama".to_string(),
                protocol: Protocol::Http,
                host: "localhost".to_string(),
                port: 11434,
                path: DEFAULT_PATH.to_string(),
            },
        ]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Canonical URL, always with an explicit port
    pub fn url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.protocol, self.host, self.port, self.path
        )
    }

    /// URL of the model listing used for probing
    pub fn models_url(&self) -> String {
        format!("{}/models", self.url().trim_end_matches('/'))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url())
    }
}

/// Unvalidated endpoint as it appears in a config file
#[derive(Deserialize)]
struct RawEndpoint {
    name: String,
    #[serde(default = "default_protocol")]
    protocol: String,
    host: String,
    port: u32,
    #[serde(default = "default_path")]
    path: String,
}

fn default_protocol() -> String {
    Protocol::Http.as_str().to_string()
}

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

impl TryFrom<RawEndpoint> for Endpoint {
    type Error = LmError;

    fn try_from(raw: RawEndpoint) -> Result<Self, Self::Error> {
        let protocol: Protocol = raw.protocol.parse()?;
        Endpoint::new(raw.name, protocol, raw.host, raw.port, raw.path)
    }
}

/// Accepts a dotted-quad IPv4 address or an RFC 1123 hostname
fn validate_host(host: &str) -> Result<(), String> {
    if host.is_empty() {
        return Err("must not be empty".to_string());
    }

    if host.parse::<Ipv4Addr>().is_ok() {
        return Ok(());
    }

    let labels: Vec<&str> = host.split('.').collect();

    // All-numeric names can only be meant as addresses
    if labels
        .iter()
        .all(|l| !l.is_empty() && l.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(format!("'{}' is not a valid IPv4 address", host));
    }

    if host.len() > MAX_HOSTNAME_LEN {
        return Err(format!(
            "hostname exceeds {} characters ({} given)",
            MAX_HOSTNAME_LEN,
            host.len()
        ));
    }

    for label in labels {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(format!(
                "'{}' is not a valid hostname (labels must be 1-{} characters)",
                host, MAX_LABEL_LEN
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(format!(
                "'{}' is not a valid hostname (labels cannot start or end with '-')",
                host
            ));
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(format!(
                "'{}' is not a valid hostname (only letters, digits and '-' are allowed)",
                host
            ));
        }
    }

    Ok(())
}
