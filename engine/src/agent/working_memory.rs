//! Working memory for the orchestration loop
//!
//! Holds the running context of one turn: the composed system prompt, the
//! user message and one observation block per executed tool batch (the
//! assistant message carrying the calls, followed by one tool message per
//! result). When the estimate goes over the context limit, whole observation
//! blocks are dropped oldest first so that a call is never separated from
//! its results. The system prompt, the user message and the most recent
//! block always stay.

use crate::llm::{Message, MessageRole};

/// Default context limit in tokens
pub const DEFAULT_CONTEXT_LIMIT: usize = 32_000;

/// Rough estimate: 1 token ≈ 4 characters
const CHARS_PER_TOKEN: usize = 4;

/// Per-message overhead for role and structure
const MESSAGE_OVERHEAD: usize = 10;

#[derive(Debug, Clone)]
pub struct WorkingMemory {
    messages: Vec<Message>,
    context_limit: usize,
    token_count: usize,
}

impl WorkingMemory {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_CONTEXT_LIMIT)
    }

    pub fn with_limit(context_limit: usize) -> Self {
        Self {
            messages: Vec::new(),
            context_limit,
            token_count: 0,
        }
    }

    /// Append a message, trimming old observation blocks if over the limit
    pub fn add_message(&mut self, message: Message) {
        self.token_count += Self::estimate_tokens(&message);
        self.messages.push(message);

        if self.token_count > self.context_limit {
            self.trim_messages();
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn context_limit(&self) -> usize {
        self.context_limit
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.token_count = 0;
    }

    /// Start index of every observation block, in order
    fn block_starts(&self) -> Vec<usize> {
        self.messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.role == MessageRole::Assistant && !m.tool_calls.is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    fn trim_messages(&mut self) {
        while self.token_count > self.context_limit {
            let starts = self.block_starts();
            // The latest block is what the oracle has to reason about next
            if starts.len() < 2 {
                break;
            }

            let start = starts[0];
            let end = self.messages[start + 1..]
                .iter()
                .position(|m| m.role != MessageRole::Tool)
                .map(|offset| start + 1 + offset)
                .unwrap_or(self.messages.len());

            let removed: usize = self
                .messages
                .drain(start..end)
                .map(|m| Self::estimate_tokens(&m))
                .sum();
            self.token_count = self.token_count.saturating_sub(removed);
        }
    }

    /// Estimate the number of tokens in a message from its character count
    fn estimate_tokens(message: &Message) -> usize {
        let tool_call_id_chars = message.tool_call_id.as_ref().map(|id| id.len()).unwrap_or(0);

        let calls_chars: usize = message
            .tool_calls
            .iter()
            .map(|c| c.id.len() + c.name.len() + serde_json::Value::Object(c.arguments.clone()).to_string().len())
            .sum();

        let total_chars = message.content.len() + tool_call_id_chars + calls_chars;
        total_chars.div_ceil(CHARS_PER_TOKEN) + MESSAGE_OVERHEAD
    }
}

impl Default for WorkingMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::types::{ToolCallRequest, ToolResult};
    use serde_json::json;

    fn push_block(memory: &mut WorkingMemory, n: usize) {
        let request = ToolCallRequest::from_json(
            format!("call_{}", n),
            "math_calculator",
            json!({"expression": format!("{} + {}", n, n)}),
        );
        memory.add_message(Message::tool_calls(vec![request.clone()]));
        memory.add_message(Message::tool_result(&ToolResult::success(
            &request,
            json!(format!("result number {} with some padding text", n)),
        )));
    }

    #[test]
    fn test_new_working_memory() {
        let memory = WorkingMemory::new();
        assert_eq!(memory.messages().len(), 0);
        assert_eq!(memory.token_count(), 0);
        assert_eq!(memory.context_limit(), DEFAULT_CONTEXT_LIMIT);
    }

    #[test]
    fn test_add_and_clear() {
        let mut memory = WorkingMemory::with_limit(4000);
        memory.add_message(Message::system("You are a helpful assistant"));
        memory.add_message(Message::user("Hello"));
        assert_eq!(memory.messages().len(), 2);
        assert!(memory.token_count() > 0);

        memory.clear();
        assert_eq!(memory.messages().len(), 0);
        assert_eq!(memory.token_count(), 0);
    }

    #[test]
    fn test_tool_calls_count_towards_estimate() {
        let bare = Message::assistant("");
        let request = ToolCallRequest::from_json("call_1", "math_calculator", json!({"expression": "(234 * 12) + 98"}));
        let with_calls = Message::tool_calls(vec![request]);
        assert!(WorkingMemory::estimate_tokens(&with_calls) > WorkingMemory::estimate_tokens(&bare));
    }

    #[test]
    fn test_trimming_drops_whole_oldest_blocks() {
        let mut memory = WorkingMemory::with_limit(150);
        memory.add_message(Message::system("System prompt"));
        memory.add_message(Message::user("Compute several things"));
        for n in 0..10 {
            push_block(&mut memory, n);
        }

        let messages = memory.messages();
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].role, MessageRole::User);
        assert_eq!(messages[1].content, "Compute several things");

        // Blocks stay intact: every assistant call message is followed by its result
        for (i, m) in messages.iter().enumerate().skip(2) {
            if m.role == MessageRole::Assistant {
                assert_eq!(messages[i + 1].role, MessageRole::Tool);
                assert_eq!(messages[i + 1].tool_call_id.as_deref(), Some(m.tool_calls[0].id.as_str()));
            }
        }
        assert_eq!(messages.last().unwrap().tool_call_id.as_deref(), Some("call_9"));
        assert!(memory.token_count() <= memory.context_limit());
    }

    #[test]
    fn test_latest_block_survives_tiny_limit() {
        let mut memory = WorkingMemory::with_limit(10);
        memory.add_message(Message::system("System"));
        memory.add_message(Message::user("Question"));
        push_block(&mut memory, 1);
        push_block(&mut memory, 2);

        assert_eq!(memory.messages().len(), 4);
        assert_eq!(memory.messages()[2].tool_calls[0].id, "call_2");
    }

    #[test]
    fn test_no_trimming_under_limit() {
        let mut memory = WorkingMemory::with_limit(10_000);
        memory.add_message(Message::system("System"));
        memory.add_message(Message::user("Question"));
        for n in 0..3 {
            push_block(&mut memory, n);
        }
        assert_eq!(memory.messages().len(), 8);
    }
}
