//! Arithmetic Core Tool
//!
//! Thin adapter from the tool contract to [`crate::evaluator`]. The tool's
//! whole capability is the evaluator: no other code path sees the expression.

use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::tool::{ParamType, Tool, ToolArgs, ToolSchema};
use serde_json::Value;
use tracing::debug;

use crate::evaluator;

pub struct MathTool {
    schema: ToolSchema,
}

impl MathTool {
    pub fn new() -> Self {
        Self {
            schema: ToolSchema::new().required(
                "expression",
                ParamType::String,
                "Arithmetic expression using numbers, parentheses and + - * / % ** (e.g. \"(234 * 12) + 98\")",
            ),
        }
    }
}

impl Default for MathTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for MathTool {
    fn name(&self) -> &str {
        "math_calculator"
    }

    fn description(&self) -> &str {
        "Safely evaluate a basic arithmetic expression and return the numeric result."
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn invoke(&self, args: ToolArgs) -> Result<Value, EngineError> {
        let expression = args.str("expression")?;
        let value = evaluator::evaluate(expression)?;
        debug!("{} = {}", expression, value);
        Ok(value.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn args(expression: &str) -> ToolArgs {
        let mut raw = Map::new();
        raw.insert("expression".to_string(), json!(expression));
        MathTool::new().schema().validate("math_calculator", &raw).unwrap()
    }

    #[tokio::test]
    async fn test_invoke_returns_number() {
        let tool = MathTool::new();
        assert_eq!(tool.invoke(args("3 * 499")).await.unwrap(), json!(1497));
        assert_eq!(tool.invoke(args("7 / 2")).await.unwrap(), json!(3.5));
    }

    #[tokio::test]
    async fn test_invoke_maps_rejection_to_evaluation_error() {
        let err = MathTool::new().invoke(args("__import__('os')")).await.unwrap_err();
        assert!(matches!(err, EngineError::Evaluation(_)));
    }
}
