//! Structured output shapes
//!
//! An [`OutputSchema`] describes the record every prompt result must match:
//! a name plus a list of typed fields. Rust types opt in through the
//! [`Structured`] trait; callers that only know the shape at runtime (the CLI,
//! for example) build an `OutputSchema` directly.

use crate::error::{LmError, LmResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Primitive type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl FieldKind {
    /// JSON Schema type name
    pub fn json_type(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
        }
    }

    /// Whether `value` has this kind
    ///
    /// Integers are accepted where numbers are expected.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_type())
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "str" => Ok(FieldKind::String),
            "integer" | "int" => Ok(FieldKind::Integer),
            "number" | "float" => Ok(FieldKind::Number),
            "boolean" | "bool" => Ok(FieldKind::Boolean),
            other => Err(format!(
                "unknown field type '{}' (expected string, integer, number or boolean)",
                other
            )),
        }
    }
}

/// A named, typed field of an output record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
}

/// Record shape requested from the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSchema {
    name: String,
    fields: Vec<SchemaField>,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field (builder style)
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(SchemaField {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Check that this describes a usable record
    ///
    /// # Errors
    /// `LmError::InvalidSchema` if the name is blank, there are no fields, or
    /// a field name is blank or repeated.
    pub fn validate(&self) -> LmResult<()> {
        let invalid = |reason: String| LmError::InvalidSchema {
            schema: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("schema name must not be empty".to_string()));
        }
        if self.fields.is_empty() {
            return Err(invalid("schema has no fields".to_string()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(invalid("field names must not be empty".to_string()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(invalid(format!("duplicate field '{}'", field.name)));
            }
        }

        Ok(())
    }

    /// JSON Schema for a list of these records
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), json!({ "type": f.kind.json_type() })))
            .collect();
        let required: Vec<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();

        json!({
            "type": "array",
            "items": {
                "title": self.name,
                "type": "object",
                "properties": properties,
                "required": required,
            }
        })
    }

    /// Check one result item against the schema
    ///
    /// Returns a description of the first problem found. Extra keys are allowed.
    pub fn check(&self, item: &Value) -> Result<(), String> {
        let object = item
            .as_object()
            .ok_or_else(|| format!("expected an object, got {}", type_name(item)))?;

        for field in &self.fields {
            match object.get(&field.name) {
                None => return Err(format!("missing field '{}'", field.name)),
                Some(value) if !field.kind.matches(value) => {
                    return Err(format!(
                        "field '{}' should be {}, got {}",
                        field.name,
                        field.kind,
                        type_name(value)
                    ));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A Rust type that can be requested as prompt output
///
/// ```
/// use lmtic::schema::{FieldKind, OutputSchema, Structured};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct CityLocation {
///     city: String,
///     country: String,
/// }
///
/// impl Structured for CityLocation {
///     fn schema() -> OutputSchema {
///         OutputSchema::new("CityLocation")
///             .field("city", FieldKind::String)
///             .field("country", FieldKind::String)
///     }
/// }
///
/// assert!(CityLocation::schema().validate().is_ok());
/// ```
pub trait Structured: DeserializeOwned + Send {
    fn schema() -> OutputSchema;
}
