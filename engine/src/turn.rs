//! Record of one user-message-to-final-answer exchange

use chrono::{DateTime, Utc};
use sdk::types::{ToolCallRequest, ToolResult};
use serde::{Deserialize, Serialize};

/// One issued call and its resolved result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExchange {
    pub request: ToolCallRequest,
    pub result: ToolResult,
}

/// A completed turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: String,
    pub user_input: String,
    pub answer: String,

    /// Calls in issuance order, each paired with its result
    pub exchanges: Vec<ToolExchange>,

    /// Tool batches executed
    pub iterations: usize,

    /// The iteration cap forced the answer
    pub incomplete: bool,

    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(
        user_input: impl Into<String>,
        answer: impl Into<String>,
        exchanges: Vec<ToolExchange>,
        iterations: usize,
        incomplete: bool,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_input: user_input.into(),
            answer: answer.into(),
            exchanges,
            iterations,
            incomplete,
            timestamp: Utc::now(),
        }
    }

    /// Plain-text form used by stores that keep a single document per turn
    pub fn transcript(&self) -> String {
        format!("User: {}\nAssistant: {}", self.user_input, self.answer)
    }

    /// Names of the tools called, in order
    pub fn tools_used(&self) -> Vec<&str> {
        self.exchanges
            .iter()
            .map(|e| e.request.name.as_str())
            .collect()
    }
}
