//! Tool call and tool result types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::EngineError;

/// A tool invocation requested by the decision oracle.
///
/// The tool name is whatever the oracle produced; it may not exist in the
/// registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Unique identifier for this call
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Raw, unvalidated arguments
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCallRequest {
    /// Create a new tool call request
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Create a request from a JSON object literal.
    ///
    /// Non-object values produce an empty argument map.
    pub fn from_json(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(id, name, arguments)
    }
}

/// Why a tool call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No tool with the requested name is registered
    NotFound,
    /// Arguments did not match the declared schema
    InvalidArguments,
    /// The expression evaluator rejected the input
    Evaluation,
    /// The tool's underlying operation failed
    Execution,
    /// The tool did not finish within its time budget
    Timeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotFound => write!(f, "not_found"),
            FailureKind::InvalidArguments => write!(f, "invalid_arguments"),
            FailureKind::Evaluation => write!(f, "evaluation"),
            FailureKind::Execution => write!(f, "execution"),
            FailureKind::Timeout => write!(f, "timeout"),
        }
    }
}

/// Structured description of a failed tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ToolFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&EngineError> for ToolFailure {
    fn from(error: &EngineError) -> Self {
        let kind = match error {
            EngineError::ToolNotFound(_) => FailureKind::NotFound,
            EngineError::ToolArgument { .. } => FailureKind::InvalidArguments,
            EngineError::Evaluation(_) => FailureKind::Evaluation,
            EngineError::ToolTimeout(_) => FailureKind::Timeout,
            _ => FailureKind::Execution,
        };
        Self::new(kind, error.to_string())
    }
}

impl From<EngineError> for ToolFailure {
    fn from(error: EngineError) -> Self {
        Self::from(&error)
    }
}

/// Outcome of a tool call: exactly one of success or failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { output: Value },
    Failure(ToolFailure),
}

/// Resolved result of one `ToolCallRequest`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Identifier of the request this result answers
    pub call_id: String,

    /// Tool name as requested
    pub tool_name: String,

    /// Success or failure
    pub outcome: ToolOutcome,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(request: &ToolCallRequest, output: Value) -> Self {
        Self {
            call_id: request.id.clone(),
            tool_name: request.name.clone(),
            outcome: ToolOutcome::Success { output },
        }
    }

    /// Create a failed result
    pub fn failure(request: &ToolCallRequest, failure: ToolFailure) -> Self {
        Self {
            call_id: request.id.clone(),
            tool_name: request.name.clone(),
            outcome: ToolOutcome::Failure(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Success { .. })
    }

    /// Output value, if the call succeeded
    pub fn output(&self) -> Option<&Value> {
        match &self.outcome {
            ToolOutcome::Success { output } => Some(output),
            ToolOutcome::Failure(_) => None,
        }
    }

    /// Failure description, if the call failed
    pub fn error(&self) -> Option<&ToolFailure> {
        match &self.outcome {
            ToolOutcome::Success { .. } => None,
            ToolOutcome::Failure(failure) => Some(failure),
        }
    }

    /// Render the result as observation text for the decision oracle.
    pub fn observation(&self) -> String {
        match &self.outcome {
            ToolOutcome::Success { output } => match output {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            ToolOutcome::Failure(failure) => {
                format!("ERROR ({}): {}", failure.kind, failure.message)
            }
        }
    }
}
