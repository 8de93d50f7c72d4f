//! Resolve tool calls through the registry without any network access
//!
//! Run with: cargo run --example offline_tools

use recall_engine::tools::{DateTool, MathTool, TextAnalysisTool, ToolRegistry};
use sdk::types::ToolCallRequest;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut registry = ToolRegistry::empty();
    registry.register(Arc::new(MathTool::new()))?;
    registry.register(Arc::new(DateTool::new()))?;
    registry.register(Arc::new(TextAnalysisTool::new()))?;

    let calls = [
        ToolCallRequest::from_json("1", "math_calculator", json!({"expression": "(234 * 12) + 98"})),
        ToolCallRequest::from_json("2", "math_calculator", json!({"expression": "3 * 499"})),
        ToolCallRequest::from_json("3", "date_utility_tool", json!({"days": 7})),
        ToolCallRequest::from_json("4", "analyze_text", json!({"text": "What a great day"})),
        ToolCallRequest::from_json("5", "math_calculator", json!({"expression": "__import__('os')"})),
        ToolCallRequest::from_json("6", "get_stock_price", json!({"ticker": "ACME"})),
    ];

    for call in &calls {
        let result = registry.resolve(call, Duration::from_secs(5)).await;
        println!("{:<18} {}", call.name, result.observation());
    }

    Ok(())
}
