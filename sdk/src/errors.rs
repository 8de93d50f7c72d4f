//! Error types and handling
//!
//! This module provides the error taxonomy used throughout the Recall engine.
//! All errors implement the `RecallErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Propagation
//!
//! Per-call failures (evaluation, unknown tool, bad arguments, tool execution)
//! are converted into structured tool results close to where they happen and
//! never unwind past the orchestration loop. Only two classes escape:
//!
//! - **Configuration**: fatal at startup, before any session exists
//! - **Oracle unavailable**: fatal for the current turn only
//!
//! # Examples
//!
//! ```
//! use sdk::errors::{EngineError, RecallErrorExt};
//!
//! let error = EngineError::ToolNotFound("teleport".to_string());
//! println!("Hint: {}", error.user_hint());
//! assert!(error.is_recoverable());
//!
//! let fatal_error = EngineError::Config("GEMINI_API_KEY not found".to_string());
//! assert!(!fatal_error.is_recoverable());
//! ```

use std::time::Duration;
use thiserror::Error;

/// Trait for Recall error extensions
///
/// Provides additional context for errors, including user-friendly hints and
/// recoverability information. Hints never contain secrets or raw payloads.
pub trait RecallErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors end at most the current turn. Non-recoverable
    /// errors prevent a session from starting.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Expression evaluator errors
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    // Tool errors
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid arguments for tool '{tool}': {reason}")]
    ToolArgument { tool: String, reason: String },

    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    #[error("Tool timed out after {0:?}")]
    ToolTimeout(Duration),

    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    // Memory errors
    #[error("Memory unavailable: {0}")]
    MemoryUnavailable(String),

    // Decision oracle errors
    #[error("Decision oracle unavailable: {0}")]
    OracleUnavailable(String),

    // Orchestration errors
    #[error("Orchestration limit exceeded after {0} iterations")]
    OrchestrationLimitExceeded(usize),

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // Keyring errors
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecallErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml and required API keys",

            Self::Evaluation(_) => "The expression could not be evaluated. Use numbers and + - * / % ** only",

            Self::ToolNotFound(_) => "The requested tool is not available",
            Self::ToolArgument { .. } => "The tool was called with invalid arguments",
            Self::ToolExecution(_) => "Tool operation failed. Results may be incomplete",
            Self::ToolTimeout(_) => "A tool took too long to respond. Try again",
            Self::DuplicateTool(_) => "Two tools share the same name. Check tool registration",

            Self::MemoryUnavailable(_) => "Long-term memory is unavailable. Answers will not be personalized",

            Self::OracleUnavailable(_) => "The language model is unavailable. Check your network and try again",

            Self::OrchestrationLimitExceeded(_) => "Request too complex. Try breaking it into smaller steps",

            Self::Database(_) => "Local memory database operation failed",
            Self::KeyringError(_) => "Failed to access secure storage. Check system keychain",
            Self::Network(_) => "Network operation failed. Check your connection",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Non-recoverable errors
            Self::Config(_) | Self::DuplicateTool(_) | Self::KeyringError(_) => false,

            // All other errors end at most the current turn
            _ => true,
        }
    }
}
