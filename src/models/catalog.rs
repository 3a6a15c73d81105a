//! Model listings advertised by an endpoint
//!
//! Mirrors the body of `GET {base}/models` on OpenAI-compatible servers:
//! `{"object": "list", "data": [{"id": ..., "object": ..., "owned_by": ...}]}`.

use serde::{Deserialize, Serialize};

/// One model advertised by an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub owned_by: String,
}

impl ModelInfo {
    /// Build a model entry with `object` set to `"model"`
    pub fn new(id: impl Into<String>, owned_by: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: "model".to_string(),
            owned_by: owned_by.into(),
        }
    }
}

/// Ordered model list as returned by the endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelList {
    #[serde(default = "default_list_object")]
    pub object: String,
    pub data: Vec<ModelInfo>,
}

fn default_list_object() -> String {
    "list".to_string()
}

impl ModelList {
    pub fn new(data: Vec<ModelInfo>) -> Self {
        Self {
            object: default_list_object(),
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Model identifiers in advertised order
    pub fn ids(&self) -> Vec<&str> {
        self.data.iter().map(|m| m.id.as_str()).collect()
    }
}
