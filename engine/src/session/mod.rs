//! Session controller
//!
//! Drives one conversation: reads a line, handles the built-in commands,
//! otherwise retrieves memory, composes the prompt, runs the orchestration
//! loop, shows the answer and writes the turn back to memory.
//!
//! Input and output are generic so the whole conversation can be scripted
//! in tests.

use sdk::errors::{EngineError, RecallErrorExt};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info};

use crate::agent::{Orchestrator, PromptComposer};
use crate::memory::{MemoryGateway, StoreOutcome};
use crate::turn::Turn;

/// Inputs that end the session, matched case-insensitively after trimming
pub const EXIT_TOKENS: [&str; 4] = ["exit", "quit", "bye", "q"];

/// Input that reports session statistics
pub const INFO_COMMAND: &str = "clear";

/// What a line of user input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Exit,
    Info,
    Empty,
    Query(String),
}

impl SessionCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return SessionCommand::Empty;
        }

        let lowered = trimmed.to_lowercase();
        if EXIT_TOKENS.contains(&lowered.as_str()) {
            SessionCommand::Exit
        } else if lowered == INFO_COMMAND {
            SessionCommand::Info
        } else {
            SessionCommand::Query(trimmed.to_string())
        }
    }
}

/// State of one conversation
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,

    /// Completed turns, for display only
    pub history: Vec<Turn>,

    pub active: bool,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            history: Vec::new(),
            active: true,
        }
    }

    pub fn turn_count(&self) -> usize {
        self.history.len()
    }
}

pub struct SessionController {
    orchestrator: Orchestrator,
    composer: PromptComposer,
    gateway: MemoryGateway,
    session: Session,
}

impl SessionController {
    pub fn new(
        orchestrator: Orchestrator,
        composer: PromptComposer,
        gateway: MemoryGateway,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator,
            composer,
            gateway,
            session: Session::new(user_id),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn gateway(&self) -> &MemoryGateway {
        &self.gateway
    }

    /// Run a single query through memory, prompt composition and the loop.
    ///
    /// The finished turn is written back to memory and added to the session
    /// history. A failed turn is neither stored nor recorded.
    pub async fn run_turn(&mut self, input: &str) -> Result<Turn, EngineError> {
        let user_id = self.session.user_id.clone();
        info!("[Turn {}] User query: {}", self.session.turn_count() + 1, input);

        let retrieval = self.gateway.retrieve(input, &user_id).await;
        let catalogue = self.orchestrator.registry().catalogue();
        let system_prompt = self.composer.compose(&catalogue, &retrieval);

        let outcome = self.orchestrator.run(&system_prompt, input).await?;
        let turn = Turn::new(
            input,
            outcome.answer,
            outcome.exchanges,
            outcome.iterations,
            outcome.incomplete,
        );

        if let StoreOutcome::Dropped(reason) = self.gateway.store(&turn, &user_id).await {
            info!("Turn {} not saved to memory: {}", turn.id, reason);
        }

        self.session.history.push(turn.clone());
        Ok(turn)
    }

    /// Run the interactive loop until an exit token or end of input
    pub async fn run<R, W>(&mut self, input: R, output: &mut W) -> Result<(), EngineError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        info!("Interactive session started for user {}", self.session.user_id);
        self.print_banner(output)?;

        let mut lines = input.lines();
        while self.session.active {
            write!(output, "You: ")?;
            output.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(output)?;
                break;
            };

            match SessionCommand::parse(&line) {
                SessionCommand::Empty => {
                    writeln!(output, "Please enter a message.\n")?;
                }
                SessionCommand::Exit => {
                    writeln!(output, "\nGoodbye! Your conversation has been saved to memory.")?;
                    self.session.active = false;
                }
                SessionCommand::Info => {
                    writeln!(
                        output,
                        "\nYou've had {} conversation turn(s) in this session.\n",
                        self.session.turn_count()
                    )?;
                }
                SessionCommand::Query(query) => match self.run_turn(&query).await {
                    Ok(turn) => {
                        writeln!(output, "Assistant: {}\n", turn.answer)?;
                    }
                    Err(e) => {
                        error!("Turn failed: {}", e);
                        writeln!(output, "\nError: {}", e.user_hint())?;
                        writeln!(output, "Please try again or type 'exit' to quit.\n")?;
                    }
                },
            }
        }

        self.session.active = false;
        info!(
            "Interactive session ended after {} turn(s)",
            self.session.turn_count()
        );
        Ok(())
    }

    fn print_banner<W: Write>(&self, output: &mut W) -> Result<(), EngineError> {
        let rule = "=".repeat(70);
        writeln!(output, "{}", rule)?;
        writeln!(output, " Recall - tool-calling assistant with memory")?;
        writeln!(output, "{}", rule)?;
        writeln!(output, "Commands:")?;
        writeln!(output, "  - type your question to chat")?;
        writeln!(output, "  - 'exit', 'quit', 'bye', 'q' to end the conversation")?;
        writeln!(output, "  - 'clear' to see how many turns this session has had")?;
        writeln!(
            output,
            "Tools: {}",
            self.orchestrator.registry().names().join(", ")
        )?;
        writeln!(output, "Memory: {}", self.gateway.backend_name())?;
        writeln!(output, "{}\n", "-".repeat(70))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_tokens_case_insensitive() {
        for input in ["exit", "QUIT", "  Bye  ", "q", "Q\n"] {
            assert_eq!(SessionCommand::parse(input), SessionCommand::Exit, "{:?}", input);
        }
    }

    #[test]
    fn test_exit_requires_exact_match() {
        assert_eq!(
            SessionCommand::parse("quit now"),
            SessionCommand::Query("quit now".to_string())
        );
        assert_eq!(SessionCommand::parse("qq"), SessionCommand::Query("qq".to_string()));
    }

    #[test]
    fn test_info_and_empty() {
        assert_eq!(SessionCommand::parse(" Clear "), SessionCommand::Info);
        assert_eq!(SessionCommand::parse("   "), SessionCommand::Empty);
        assert_eq!(SessionCommand::parse(""), SessionCommand::Empty);
    }

    #[test]
    fn test_query_is_trimmed() {
        assert_eq!(
            SessionCommand::parse("  What is 2+2?  "),
            SessionCommand::Query("What is 2+2?".to_string())
        );
    }

    #[test]
    fn test_new_session() {
        let session = Session::new("alice");
        assert!(session.active);
        assert_eq!(session.turn_count(), 0);
    }
}
