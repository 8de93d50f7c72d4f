//! Recall Engine Library
//!
//! Core of the Recall assistant: a decision oracle solves each user request
//! by calling tools, observing their results and composing an answer, with
//! relevant facts from a per-user long-term memory folded into its prompt.
//! Used by the `recall` binary and by integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// Telemetry and Observability
pub mod telemetry;

/// Sandboxed arithmetic expression evaluator
pub mod evaluator;

/// Built-in tools and the tool registry
pub mod tools;

/// Decision oracle abstraction and providers
pub mod llm;

/// Long-term memory gateway and backends
pub mod memory;

/// Prompt composition and the orchestration loop
pub mod agent;

/// Completed turn record
pub mod turn;

/// Conversation driver
pub mod session;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
