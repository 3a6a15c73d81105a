//! lmtic - structured prompts against locally hosted LLMs
//!
//! Finds a working OpenAI-compatible model server among a list of candidate
//! endpoints, picks the advertised model closest to a requested name, and runs
//! prompts whose answers come back as typed, schema-checked records.
//!
//! ```no_run
//! use lmtic::{FieldKind, LmSession, OutputSchema, SessionOptions, Structured};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct CityLocation {
//!     city: String,
//!     country: String,
//! }
//!
//! impl Structured for CityLocation {
//!     fn schema() -> OutputSchema {
//!         OutputSchema::new("CityLocation")
//!             .field("city", FieldKind::String)
//!             .field("country", FieldKind::String)
//!     }
//! }
//!
//! # async fn demo() -> lmtic::LmResult<()> {
//! let session = LmSession::connect(SessionOptions::new("qwen")).await?;
//! let cities: Vec<CityLocation> = session
//!     .run_prompt("Where were the Olympics held in 2012?")
//!     .await?;
//! println!("{:?}", cities);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod matcher;
pub mod models;
pub mod resolver;
pub mod schema;
pub mod session;
pub mod telemetry;

pub use agent::{AgentError, AgentProvider, AgentSettings, StructuredAgent};
pub use error::{LmError, LmResult};
pub use matcher::{select_model, similarity_ratio};
pub use models::{Endpoint, ModelInfo, ModelList, Protocol};
pub use resolver::EndpointResolver;
pub use schema::{FieldKind, OutputSchema, Structured};
pub use session::{LmSession, SessionOptions};
