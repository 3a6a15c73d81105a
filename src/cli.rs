//! Command-line interface for lmtic
//!
//! Provides argument parsing and subcommand handling for the `lmtic` binary.

use crate::config::Config;
use crate::error::LmResult;
use crate::schema::{FieldKind, OutputSchema, SchemaField};
use crate::session::SessionOptions;
use clap::{Args, Parser, Subcommand};
use std::path::Path;

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Structured prompts against locally hosted LLMs
#[derive(Parser)]
#[command(name = "lmtic")]
#[command(version)]
#[command(about = "Structured prompts against locally hosted LLMs")]
#[command(
    long_about = "lmtic finds a running OpenAI-compatible model server (LM Studio, Ollama, ...), \
    picks the model closest to the requested name, and asks it for JSON records of a given shape."
)]
pub struct Cli {
    /// Path to configuration file [default: config.toml, if present]
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Resolve an endpoint and list its models, best match first
    Models {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Run a prompt and print the results as JSON
    Prompt {
        /// Prompt text
        prompt: String,

        /// Output field as NAME:TYPE (string, integer, number, boolean); repeatable
        #[arg(short, long = "field", required = true, value_parser = parse_field)]
        fields: Vec<SchemaField>,

        /// Name of the output record
        #[arg(long, default_value = "Result")]
        schema_name: String,

        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Overrides for the endpoint and model from the config file
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Requested model name (closest match is used)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Explicit base URL; disables endpoint fallback
    #[arg(short, long)]
    pub url: Option<String>,
}

/// Parse a `NAME:TYPE` field argument
pub fn parse_field(arg: &str) -> Result<SchemaField, String> {
    let (name, kind) = arg
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:TYPE, got '{}'", arg))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("field name missing in '{}'", arg));
    }
    let kind: FieldKind = kind.trim().parse()?;
    Ok(SchemaField {
        name: name.to_string(),
        kind,
    })
}

/// Build the runtime schema for the `prompt` command
pub fn schema_from_fields(name: &str, fields: &[SchemaField]) -> OutputSchema {
    fields
        .iter()
        .fold(OutputSchema::new(name), |schema, f| {
            schema.field(f.name.clone(), f.kind)
        })
}

/// Load the configuration named on the command line
///
/// Without `--config`, `config.toml` is read if it exists and built-in
/// defaults are used otherwise. An explicitly named file must exist.
pub fn load_config(explicit: Option<&str>) -> LmResult<Config> {
    match explicit {
        Some(path) => Config::from_file(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::from_file(DEFAULT_CONFIG_PATH),
        None => Ok(Config::default()),
    }
}

/// Session options from the config with command-line overrides applied
pub fn session_options(config: &Config, target: &TargetArgs) -> LmResult<SessionOptions> {
    let mut options = config.session_options()?;
    if let Some(model) = &target.model {
        options.model_name = model.clone();
    }
    if let Some(url) = &target.url {
        options.base_url = Some(url.clone());
    }
    Ok(options)
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# lmtic Configuration
# ===================
#
# Every section is optional. Without a config file lmtic asks for a model
# named "qwen" and probes LM Studio (port 1234) and then Ollama (port 11434)
# on localhost.

# ─────────────────────────────────────────────────────────────────────────────
# SESSION
# ─────────────────────────────────────────────────────────────────────────────

[session]
# Requested model. An exact id wins; otherwise the most similar id is used.
model = "qwen"

# Explicit base URL. When set, only this endpoint is tried and
# [[endpoints]] is ignored. Missing scheme/port/path default to
# http / 80 or 443 / "/v1".
# base_url = "http://localhost:1234/v1"

# Timeout for each endpoint probe (GET {base}/models), 1-60 seconds
probe_timeout_seconds = 2

# ─────────────────────────────────────────────────────────────────────────────
# ENDPOINT CANDIDATES
# ─────────────────────────────────────────────────────────────────────────────
#
# Tried in order; the first one that lists at least one model is used.
# Remove all entries to fall back to the built-in defaults, or write
# `endpoints = []` at the top level to disable probing entirely.
#
# Endpoint fields:
#   - name: Label used in logs
#   - protocol: "http" or "https" (default "http")
#   - host: Hostname or IPv4 address
#   - port: 1-65535
#   - path: API base path, must start with "/" (default "/v1")

[[endpoints]]
name = "lmstudio"
protocol = "http"
host = "localhost"
port = 1234
path = "/v1"

[[endpoints]]
name = "ollama"
protocol = "http"
host = "localhost"
port = 11434
path = "/v1"

# ─────────────────────────────────────────────────────────────────────────────
# AGENT
# ─────────────────────────────────────────────────────────────────────────────

[agent]
# Maximum tokens to generate per prompt
max_tokens = 2048

# Sampling temperature (0.0-2.0)
temperature = 0.7

# Time allowed for one prompt, 1-300 seconds
request_timeout_seconds = 120

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"
"#
}
