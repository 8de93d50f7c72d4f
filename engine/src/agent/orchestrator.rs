//! Orchestration loop
//!
//! Drives one turn as a small state machine:
//!
//! - `AwaitingDecision`: ask the oracle, bounded by the oracle timeout
//! - `ExecutingTools`: resolve every call of the batch through the registry,
//!   append the results as observations, count one iteration
//! - `Finalized`: hand back the answer and the ordered call/result pairs
//!
//! Tool failures are ordinary results and never leave the loop. Only an
//! unusable oracle ends the turn with an error. Reaching the iteration cap
//! finalizes with an answer synthesized from what was gathered.

use futures::future::join_all;
use sdk::errors::EngineError;
use sdk::types::{ToolCallRequest, ToolResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::working_memory::WorkingMemory;
use crate::config::AgentConfig;
use crate::llm::{Decision, DecisionOracle, Message};
use crate::tools::ToolRegistry;
use crate::turn::ToolExchange;

/// Marker that starts every answer forced by the iteration cap
pub const INCOMPLETE_MARKER: &str = "[incomplete]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingDecision,
    ExecutingTools,
    Finalized,
}

/// Bounds applied to a single turn
#[derive(Debug, Clone)]
pub struct LoopLimits {
    /// Maximum number of tool batches per turn
    pub max_iterations: usize,
    pub oracle_timeout: Duration,
    pub tool_timeout: Duration,
    pub parallel_tool_calls: bool,
    pub context_token_limit: usize,
}

impl LoopLimits {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            oracle_timeout: Duration::from_secs(config.oracle_timeout_secs),
            tool_timeout: Duration::from_secs(config.tool_timeout_secs),
            parallel_tool_calls: config.parallel_tool_calls,
            context_token_limit: config.context_token_limit,
        }
    }
}

impl Default for LoopLimits {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

/// What a finalized turn produced
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub answer: String,

    /// Every issued call with its result, in issuance order
    pub exchanges: Vec<ToolExchange>,

    /// Tool batches executed
    pub iterations: usize,

    /// The iteration cap forced the answer
    pub incomplete: bool,

    pub duration_ms: u64,
}

pub struct Orchestrator {
    oracle: Arc<dyn DecisionOracle>,
    registry: Arc<ToolRegistry>,
    limits: LoopLimits,
}

impl Orchestrator {
    pub fn new(oracle: Arc<dyn DecisionOracle>, registry: Arc<ToolRegistry>, limits: LoopLimits) -> Self {
        Self {
            oracle,
            registry,
            limits,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one turn to completion.
    ///
    /// # Errors
    ///
    /// `EngineError::OracleUnavailable` when the oracle fails, times out or
    /// returns something that is not a usable decision.
    pub async fn run(&self, system_prompt: &str, user_input: &str) -> Result<TurnOutcome, EngineError> {
        let start = Instant::now();
        let catalogue = self.registry.catalogue();

        let mut memory = WorkingMemory::with_limit(self.limits.context_token_limit);
        memory.add_message(Message::system(system_prompt));
        memory.add_message(Message::user(user_input));

        let mut exchanges: Vec<ToolExchange> = Vec::new();
        let mut iterations = 0;
        let mut pending: Vec<ToolCallRequest> = Vec::new();
        let mut answer = String::new();
        let mut incomplete = false;
        let mut state = LoopState::AwaitingDecision;

        while state != LoopState::Finalized {
            match state {
                LoopState::AwaitingDecision => {
                    debug!(
                        "Consulting {} ({} messages, ~{} tokens)",
                        self.oracle.name(),
                        memory.messages().len(),
                        memory.token_count()
                    );

                    match self.decide(memory.messages(), &catalogue).await? {
                        Decision::FinalAnswer(text) => {
                            answer = text;
                            state = LoopState::Finalized;
                        }
                        Decision::ToolCalls(calls) => {
                            pending = calls;
                            state = LoopState::ExecutingTools;
                        }
                    }
                }
                LoopState::ExecutingTools => {
                    let calls = std::mem::take(&mut pending);
                    let results = self.execute_batch(&calls).await;

                    memory.add_message(Message::tool_calls(calls.clone()));
                    for result in &results {
                        memory.add_message(Message::tool_result(result));
                    }
                    exchanges.extend(
                        calls
                            .into_iter()
                            .zip(results)
                            .map(|(request, result)| ToolExchange { request, result }),
                    );

                    iterations += 1;
                    debug!("Iteration {}/{} complete", iterations, self.limits.max_iterations);

                    if iterations >= self.limits.max_iterations {
                        let limit = EngineError::OrchestrationLimitExceeded(iterations);
                        warn!("{}; finalizing with gathered results", limit);
                        answer = synthesize_incomplete(iterations, &exchanges);
                        incomplete = true;
                        state = LoopState::Finalized;
                    } else {
                        state = LoopState::AwaitingDecision;
                    }
                }
                LoopState::Finalized => {}
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Turn finalized after {} iteration(s), {} tool call(s) in {}ms",
            iterations,
            exchanges.len(),
            duration_ms
        );

        Ok(TurnOutcome {
            answer,
            exchanges,
            iterations,
            incomplete,
            duration_ms,
        })
    }

    async fn decide(&self, messages: &[Message], catalogue: &[sdk::tool::ToolSpec]) -> Result<Decision, EngineError> {
        let decision = match timeout(self.limits.oracle_timeout, self.oracle.decide(messages, catalogue)).await {
            Ok(Ok(decision)) => decision,
            Ok(Err(e)) => {
                error!("Oracle call failed: {}", e);
                return Err(e.into());
            }
            Err(_) => {
                error!("Oracle call timed out after {:?}", self.limits.oracle_timeout);
                return Err(EngineError::OracleUnavailable(format!(
                    "no decision within {:?}",
                    self.limits.oracle_timeout
                )));
            }
        };

        if let Decision::ToolCalls(calls) = &decision {
            if calls.is_empty() {
                error!("Oracle returned an empty tool-call batch");
                return Err(EngineError::OracleUnavailable(
                    "decision contained no tool calls".to_string(),
                ));
            }
        }
        Ok(decision)
    }

    /// Resolve every call of a batch; results come back in request order
    async fn execute_batch(&self, calls: &[ToolCallRequest]) -> Vec<ToolResult> {
        let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
        info!("Executing {} tool call(s): {:?}", calls.len(), names);

        if self.limits.parallel_tool_calls {
            join_all(calls.iter().map(|c| self.registry.resolve(c, self.limits.tool_timeout))).await
        } else {
            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                results.push(self.registry.resolve(call, self.limits.tool_timeout).await);
            }
            results
        }
    }
}

/// Best-effort answer built from the results gathered before the cap
fn synthesize_incomplete(iterations: usize, exchanges: &[ToolExchange]) -> String {
    let mut answer = format!(
        "{} Stopped after {} tool iteration(s) without a final answer.",
        INCOMPLETE_MARKER, iterations
    );

    let successes: Vec<&ToolExchange> = exchanges.iter().filter(|e| e.result.is_success()).collect();
    if successes.is_empty() {
        answer.push_str(" No tool produced a usable result.");
    } else {
        answer.push_str(" Results gathered so far:");
        for exchange in successes {
            answer.push_str(&format!(
                "\n- {}: {}",
                exchange.request.name,
                exchange.result.observation()
            ));
        }
    }
    answer
}
