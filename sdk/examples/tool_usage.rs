//! Example demonstrating the Tool trait, schema validation and ToolResult
//!
//! Implements a tiny `echo` tool, validates oracle-style arguments against its
//! schema and turns the outcome into a `ToolResult`.

use async_trait::async_trait;
use sdk::{
    EngineError, ParamType, Tool, ToolArgs, ToolCallRequest, ToolFailure, ToolResult, ToolSchema,
};
use serde_json::{json, Value};

struct EchoTool {
    schema: ToolSchema,
}

impl EchoTool {
    fn new() -> Self {
        Self {
            schema: ToolSchema::new()
                .required("text", ParamType::String, "Text to echo back")
                .optional("shout", ParamType::Boolean, "Upper-case the text"),
        }
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the given text"
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn invoke(&self, args: ToolArgs) -> Result<Value, EngineError> {
        let text = args.str("text")?;
        if args.bool_opt("shout").unwrap_or(false) {
            Ok(json!(text.to_uppercase()))
        } else {
            Ok(json!(text))
        }
    }
}

async fn resolve(tool: &EchoTool, request: &ToolCallRequest) -> ToolResult {
    let args = match tool.schema().validate(tool.name(), &request.arguments) {
        Ok(args) => args,
        Err(e) => return ToolResult::failure(request, ToolFailure::from(e)),
    };
    match tool.invoke(args).await {
        Ok(output) => ToolResult::success(request, output),
        Err(e) => ToolResult::failure(request, ToolFailure::from(e)),
    }
}

#[tokio::main]
async fn main() {
    let tool = EchoTool::new();

    println!("Catalogue entry: {:?}", tool.spec());
    println!("JSON schema: {}", tool.schema().to_json_schema());

    // Example 1: valid arguments
    let ok = ToolCallRequest::from_json("call_1", "echo", json!({"text": "hello", "shout": true}));
    let result = resolve(&tool, &ok).await;
    println!("Valid call -> {}", result.observation());

    // Example 2: wrong argument type never reaches invoke()
    let bad = ToolCallRequest::from_json("call_2", "echo", json!({"text": 42}));
    let result = resolve(&tool, &bad).await;
    println!("Invalid call -> {}", result.observation());
}
