//! Recall SDK
//!
//! Shared library providing the tool contract, call/result types and the error
//! taxonomy used by the Recall engine and by anything that implements tools
//! for it.

/// Error types and handling
pub mod errors;

/// Tool capability trait and argument schemas
pub mod tool;

/// Tool call request/result types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, RecallErrorExt};
pub use tool::{ParamSpec, ParamType, Tool, ToolArgs, ToolSchema, ToolSpec};
pub use types::{FailureKind, ToolCallRequest, ToolFailure, ToolOutcome, ToolResult};
