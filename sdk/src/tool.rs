//! Tool capability trait and argument schemas
//!
//! Every callable tool implements [`Tool`]. The engine's registry maps a tool
//! name to one instance, validates raw oracle arguments against the tool's
//! [`ToolSchema`] and only then hands the resulting [`ToolArgs`] to
//! [`Tool::invoke`]. A tool therefore never sees arguments it did not declare.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

use crate::errors::EngineError;

/// JSON type of a declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::String => write!(f, "string"),
            ParamType::Integer => write!(f, "integer"),
            ParamType::Number => write!(f, "number"),
            ParamType::Boolean => write!(f, "boolean"),
        }
    }
}

/// A single named parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    pub description: String,
    pub required: bool,
}

/// Declared parameters of a tool, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    params: Vec<ParamSpec>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required parameter
    pub fn required(mut self, name: &str, kind: ParamType, description: &str) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
        });
        self
    }

    /// Add an optional parameter
    pub fn optional(mut self, name: &str, kind: ParamType, description: &str) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: false,
        });
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Render as a JSON Schema object for function-calling APIs
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.kind.to_string(),
                    "description": param.description,
                }),
            );
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Validate raw arguments against this schema.
    ///
    /// Rejects missing required fields, values of the wrong type and fields the
    /// schema does not declare. Integral floats (`7.0`) are accepted for
    /// integer parameters and normalized to integers.
    pub fn validate(&self, tool: &str, raw: &Map<String, Value>) -> Result<ToolArgs, EngineError> {
        let invalid = |reason: String| EngineError::ToolArgument {
            tool: tool.to_string(),
            reason,
        };

        if let Some(unknown) = raw
            .keys()
            .find(|key| !self.params.iter().any(|p| &p.name == *key))
        {
            return Err(invalid(format!("unexpected argument '{}'", unknown)));
        }

        let mut values = Map::new();
        for param in &self.params {
            match raw.get(&param.name) {
                None | Some(Value::Null) => {
                    if param.required {
                        return Err(invalid(format!(
                            "missing required argument '{}'",
                            param.name
                        )));
                    }
                }
                Some(value) => {
                    let checked = check_type(param.kind, value).ok_or_else(|| {
                        invalid(format!(
                            "argument '{}' must be of type {}, got {}",
                            param.name,
                            param.kind,
                            json_type_name(value)
                        ))
                    })?;
                    values.insert(param.name.clone(), checked);
                }
            }
        }

        Ok(ToolArgs { values })
    }
}

fn check_type(kind: ParamType, value: &Value) -> Option<Value> {
    match kind {
        ParamType::String => value.is_string().then(|| value.clone()),
        ParamType::Boolean => value.is_boolean().then(|| value.clone()),
        ParamType::Number => value.is_number().then(|| value.clone()),
        ParamType::Integer => {
            if let Some(i) = value.as_i64() {
                return Some(json!(i));
            }
            let f = value.as_f64()?;
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Some(json!(f as i64))
            } else {
                None
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Arguments that passed schema validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs {
    values: Map<String, Value>,
}

impl ToolArgs {
    fn missing(key: &str) -> EngineError {
        EngineError::ToolExecution(format!("validated argument '{}' is absent", key))
    }

    /// Get a string argument
    pub fn str(&self, key: &str) -> Result<&str, EngineError> {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| Self::missing(key))
    }

    /// Get an integer argument
    pub fn i64(&self, key: &str) -> Result<i64, EngineError> {
        self.values
            .get(key)
            .and_then(Value::as_i64)
            .ok_or_else(|| Self::missing(key))
    }

    /// Get an optional boolean argument
    pub fn bool_opt(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

/// Catalogue entry describing a tool to the decision oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub schema: ToolSchema,
}

/// Capability interface every tool implements
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name, as the oracle will call it
    fn name(&self) -> &str;

    /// What the tool does, for the oracle's benefit
    fn description(&self) -> &str;

    /// Declared parameters
    fn schema(&self) -> &ToolSchema;

    /// Run the tool with validated arguments
    async fn invoke(&self, args: ToolArgs) -> Result<Value, EngineError>;

    /// Catalogue entry for this tool
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            schema: self.schema().clone(),
        }
    }
}
