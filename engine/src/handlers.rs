//! Command handlers for CLI operations
//!
//! - chat: interactive session
//! - ask: one turn
//! - demo: the built-in example queries
//! - tools: tool catalogue
//! - eval: expression evaluator, no services involved
//! - secret: keychain management

use anyhow::{Context, Result};
use sdk::errors::RecallErrorExt;
use serde_json::json;
use std::sync::Arc;
use tokio::io::BufReader;

use crate::agent::{LoopLimits, Orchestrator, PromptComposer};
use crate::config::Config;
use crate::evaluator;
use crate::llm::GeminiOracle;
use crate::memory::MemoryGateway;
use crate::secrets::{Credentials, SecretManager, SecretString, KNOWN_SECRETS, SERVICE_NAME, WEATHER_API_KEY};
use crate::session::SessionController;
use crate::tools::ToolRegistry;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Example queries run by `recall demo`: (title, query)
pub const DEMO_QUERIES: [(&str, &str); 3] = [
    (
        "Math Calculation",
        "Evaluate this arithmetic expression: (234 * 12) + 98 and provide the result clearly.",
    ),
    (
        "Multi-Tool Usage",
        "If I buy 3 items priced at 499 each, calculate the total cost and tell me the expected delivery date if shipping takes 7 days.",
    ),
    (
        "Weather API",
        "Fetch today's weather in Chandigarh and suggest suitable clothing based on the temperature and conditions.",
    ),
];

/// Wire up credentials, tools, oracle and memory for a session.
///
/// Missing required credentials fail here, before any session starts.
pub async fn build_controller(config: &Config, user_id: &str) -> Result<SessionController> {
    let manager = SecretManager::new(SERVICE_NAME);
    let credentials = Credentials::load(&manager, config)?;

    let registry = Arc::new(ToolRegistry::builtin(&config.tools, &credentials)?);
    let oracle = Arc::new(GeminiOracle::new(
        config.llm.gemini.clone(),
        credentials.gemini_api_key.clone(),
    ));
    let orchestrator = Orchestrator::new(oracle, registry, LoopLimits::from_config(&config.agent));
    let gateway = MemoryGateway::from_config(config, &credentials).await;

    Ok(SessionController::new(
        orchestrator,
        PromptComposer::default(),
        gateway,
        user_id,
    ))
}

/// Interactive chat on stdin/stdout until an exit token, EOF or Ctrl+C
pub async fn handle_chat(config: &Config, user_id: &str) -> Result<()> {
    let mut controller = build_controller(config, user_id).await?;
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    tokio::select! {
        result = controller.run(stdin, &mut stdout) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Chat interrupted by Ctrl+C");
            println!("\n\nInterrupted. Exiting chat.");
        }
    }
    Ok(())
}

/// Answer one query and store the turn
pub async fn handle_ask(query: String, config: &Config, user_id: &str, format: OutputFormat) -> Result<()> {
    let mut controller = build_controller(config, user_id).await?;

    match controller.run_turn(&query).await {
        Ok(turn) => {
            match format {
                OutputFormat::Text => println!("{}", turn.answer),
                OutputFormat::Json => {
                    let output = json!({
                        "status": if turn.incomplete { "incomplete" } else { "completed" },
                        "turn": turn,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
            }
            Ok(())
        }
        Err(e) => {
            match format {
                OutputFormat::Text => println!("✗ {}", e.user_hint()),
                OutputFormat::Json => {
                    let output = json!({
                        "status": "failed",
                        "error": e.to_string(),
                        "hint": e.user_hint(),
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
            }
            Err(e.into())
        }
    }
}

/// Run every example query; a failing example does not stop the others
pub async fn handle_demo(config: &Config, user_id: &str, format: OutputFormat) -> Result<()> {
    let mut controller = build_controller(config, user_id).await?;
    let mut reports = Vec::new();

    for (idx, (title, query)) in DEMO_QUERIES.iter().enumerate() {
        let idx = idx + 1;
        tracing::info!("[Example {}] {}: {}", idx, title, query);

        match controller.run_turn(query).await {
            Ok(turn) => {
                tracing::info!("[Example {}] completed", idx);
                if let OutputFormat::Text = format {
                    println!("\n--- Example {}: {} ---", idx, title);
                    println!("{}", turn.answer);
                }
                reports.push(json!({"title": title, "status": "completed", "turn": turn}));
            }
            Err(e) => {
                tracing::error!("[Example {}] failed: {}", idx, e);
                if let OutputFormat::Text = format {
                    println!("\n--- Example {} FAILED ---", idx);
                    println!("Error: {}", e.user_hint());
                }
                reports.push(json!({"title": title, "status": "failed", "error": e.to_string()}));
            }
        }
    }

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&json!({ "examples": reports }))?);
    }
    Ok(())
}

/// Print the catalogue of enabled tools.
///
/// Listing never contacts a service, so the weather key is only used if it
/// happens to be available.
pub async fn handle_tools(config: &Config, format: OutputFormat) -> Result<()> {
    let manager = SecretManager::new(SERVICE_NAME);
    let listing_credentials = Credentials {
        gemini_api_key: SecretString::from(""),
        weather_api_key: Some(manager.lookup(WEATHER_API_KEY).unwrap_or_else(|| SecretString::from(""))),
        mem0_api_key: None,
    };
    let registry = ToolRegistry::builtin(&config.tools, &listing_credentials)?;
    let catalogue = registry.catalogue();

    match format {
        OutputFormat::Text => {
            if catalogue.is_empty() {
                println!("No tools enabled");
                return Ok(());
            }

            println!("Available tools ({}):", catalogue.len());
            println!();
            for spec in &catalogue {
                println!("  {}", spec.name);
                println!("    {}", spec.description);
                for param in spec.schema.params() {
                    let required = if param.required { "required" } else { "optional" };
                    println!("    - {} ({}, {}): {}", param.name, param.kind, required, param.description);
                }
                println!();
            }
        }
        OutputFormat::Json => {
            let tools: Vec<_> = catalogue
                .iter()
                .map(|spec| {
                    json!({
                        "name": spec.name,
                        "description": spec.description,
                        "parameters": spec.schema.to_json_schema(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "tools": tools }))?);
        }
    }
    Ok(())
}

/// Evaluate an expression directly
pub fn handle_eval(expression: String, format: OutputFormat) -> Result<()> {
    match evaluator::evaluate(&expression) {
        Ok(value) => {
            match format {
                OutputFormat::Text => println!("{}", value),
                OutputFormat::Json => {
                    let output = json!({"expression": expression, "result": value.to_json()});
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
            }
            Ok(())
        }
        Err(e) => {
            match format {
                OutputFormat::Text => println!("✗ Evaluation error: {}", e),
                OutputFormat::Json => {
                    let output = json!({"expression": expression, "error": e.to_string()});
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
            }
            Err(sdk::errors::EngineError::from(e).into())
        }
    }
}

fn known_secret(name: &str) -> Result<&'static str> {
    let upper = name.to_ascii_uppercase();
    KNOWN_SECRETS
        .iter()
        .copied()
        .find(|known| *known == upper)
        .with_context(|| format!("Unknown secret '{}'. Expected one of: {}", name, KNOWN_SECRETS.join(", ")))
}

/// Store an API key in the keychain
pub fn handle_secret_set(name: String, value: String) -> Result<()> {
    let name = known_secret(&name)?;
    SecretManager::new(SERVICE_NAME).set_secret(name, &value)?;
    println!("✓ Stored {} in the system keychain", name);
    Ok(())
}

/// Remove an API key from the keychain
pub fn handle_secret_remove(name: String) -> Result<()> {
    let name = known_secret(&name)?;
    SecretManager::new(SERVICE_NAME).delete_secret(name)?;
    println!("✓ Removed {} from the system keychain", name);
    Ok(())
}
