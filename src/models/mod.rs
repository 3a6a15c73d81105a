//! Endpoint and model data types
//!
//! Validated endpoint locations plus the model listings they advertise.

pub mod catalog;
pub mod endpoint;

pub use catalog::{ModelInfo, ModelList};
pub use endpoint::{Endpoint, Protocol};
