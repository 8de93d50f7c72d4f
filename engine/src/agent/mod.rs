//! Agent core
//!
//! Composes the per-turn system prompt and runs the decide/act/observe loop
//! against the decision oracle and the tool registry.

pub mod orchestrator;
pub mod prompt;
pub mod working_memory;

pub use orchestrator::{LoopLimits, LoopState, Orchestrator, TurnOutcome, INCOMPLETE_MARKER};
pub use prompt::{PromptComposer, BASE_INSTRUCTIONS};
pub use working_memory::WorkingMemory;
