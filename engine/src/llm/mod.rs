//! Decision oracle abstraction
//!
//! The orchestration loop talks to a language model only through
//! [`DecisionOracle`]: it hands over the running conversation plus the tool
//! catalogue and gets back a [`Decision`], either a final answer or a
//! non-empty batch of tool calls. Providers translate this to and from their
//! own wire format; anything they cannot map to a `Decision` is a protocol
//! error.

use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::tool::ToolSpec;
use sdk::types::{ToolCallRequest, ToolResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod gemini;

pub use gemini::GeminiOracle;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),

    /// The response could not be read as a decision
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<LLMError> for EngineError {
    fn from(err: LLMError) -> Self {
        EngineError::OracleUnavailable(err.to_string())
    }
}

/// Message in a conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender (user, assistant, system, tool)
    pub role: MessageRole,

    /// Content of the message
    pub content: String,

    /// Tool calls issued by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,

    /// Optional tool call ID for tool result messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Tool name for tool result messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn plain(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::System, content)
    }

    /// Assistant message recording the tool calls it issued
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::plain(MessageRole::Assistant, "")
        }
    }

    /// Observation message carrying one tool result
    pub fn tool_result(result: &ToolResult) -> Self {
        Self {
            tool_call_id: Some(result.call_id.clone()),
            name: Some(result.tool_name.clone()),
            ..Self::plain(MessageRole::Tool, result.observation())
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Tool,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// What the oracle decided to do next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Decision {
    /// The turn is done
    FinalAnswer(String),

    /// Run these tools, then ask again. Never empty.
    ToolCalls(Vec<ToolCallRequest>),
}

impl Decision {
    /// Build a tool-call decision, rejecting an empty batch
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Result<Self> {
        if calls.is_empty() {
            return Err(LLMError::Protocol("decision contained no tool calls".to_string()));
        }
        Ok(Decision::ToolCalls(calls))
    }
}

/// The component choosing between answering and calling tools
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    /// Provider name, for logs
    fn name(&self) -> &str;

    /// Decide the next step given the conversation so far and the tools on offer
    async fn decide(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<Decision>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::types::{FailureKind, ToolFailure};
    use serde_json::json;

    #[test]
    fn test_message_creation() {
        let user_msg = Message::user("Hello");
        assert_eq!(user_msg.role, MessageRole::User);
        assert_eq!(user_msg.content, "Hello");
        assert_eq!(user_msg.tool_call_id, None);

        let system_msg = Message::system("You are a helpful assistant");
        assert_eq!(system_msg.role, MessageRole::System);
    }

    #[test]
    fn test_tool_result_message_carries_observation() {
        let request = ToolCallRequest::from_json("call_9", "math_calculator", json!({}));
        let ok = Message::tool_result(&ToolResult::success(&request, json!(2906)));
        assert_eq!(ok.role, MessageRole::Tool);
        assert_eq!(ok.content, "2906");
        assert_eq!(ok.tool_call_id.as_deref(), Some("call_9"));
        assert_eq!(ok.name.as_deref(), Some("math_calculator"));

        let failed = Message::tool_result(&ToolResult::failure(
            &request,
            ToolFailure::new(FailureKind::Evaluation, "division by zero"),
        ));
        assert!(failed.content.starts_with("ERROR (evaluation)"));
    }

    #[test]
    fn test_empty_tool_call_batch_is_protocol_error() {
        assert!(matches!(Decision::tool_calls(vec![]), Err(LLMError::Protocol(_))));
    }

    #[test]
    fn test_llm_error_becomes_oracle_unavailable() {
        let err: EngineError = LLMError::Timeout.into();
        assert!(matches!(err, EngineError::OracleUnavailable(_)));
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::tool_calls(vec![ToolCallRequest::from_json(
            "c1",
            "get_weather",
            json!({"city": "Chandigarh"}),
        )]);
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, deserialized);
    }
}
