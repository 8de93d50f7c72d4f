pub mod date;
pub mod math;
pub mod text;
pub mod weather;

pub use date::DateTool;
pub use math::MathTool;
pub use text::TextAnalysisTool;
pub use weather::WeatherTool;

use sdk::errors::EngineError;
use sdk::tool::{Tool, ToolSpec};
use sdk::types::{ToolCallRequest, ToolFailure, ToolResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ToolsConfig;
use crate::secrets::Credentials;

/// Registry of available tools that can be dispatched by the agent.
///
/// Tools are kept in registration order, which is also catalogue order. The
/// registry is filled once at startup and shared read-only afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry with no tools enabled.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the registry of built-in tools enabled in configuration.
    ///
    /// # Errors
    /// `EngineError::Config` when the weather tool is enabled without a key.
    pub fn builtin(config: &ToolsConfig, credentials: &Credentials) -> Result<Self, EngineError> {
        let mut registry = Self::empty();

        if config.math {
            registry.register(Arc::new(MathTool::new()))?;
        }
        if config.date {
            registry.register(Arc::new(DateTool::new()))?;
        }
        if config.weather.enabled {
            let api_key = credentials.weather_api_key.clone().ok_or_else(|| {
                EngineError::Config("get_weather is enabled but WEATHER_API_KEY is missing".to_string())
            })?;
            registry.register(Arc::new(WeatherTool::new(&config.weather, api_key)?))?;
        }
        if config.text {
            registry.register(Arc::new(TextAnalysisTool::new()))?;
        }

        info!("Registered {} tools: {}", registry.len(), registry.names().join(", "));
        Ok(registry)
    }

    /// Add a tool.
    ///
    /// # Errors
    /// `EngineError::DuplicateTool` if a tool with the same name exists.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), EngineError> {
        if self.lookup(tool.name()).is_some() {
            return Err(EngineError::DuplicateTool(tool.name().to_string()));
        }
        debug!("Registering tool '{}'", tool.name());
        self.tools.push(tool);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Name, description and schema of every tool, in registration order
    pub fn catalogue(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve one request into exactly one result.
    ///
    /// Never fails: unknown tools, bad arguments, tool errors and timeouts
    /// all become failure results the oracle can read and react to.
    pub async fn resolve(&self, request: &ToolCallRequest, timeout: Duration) -> ToolResult {
        info!("Dispatching tool '{}' (call {})", request.name, request.id);
        debug!("Arguments for call {}: {:?}", request.id, request.arguments);

        let Some(tool) = self.lookup(&request.name) else {
            warn!("Unknown tool requested: {}", request.name);
            let err = EngineError::ToolNotFound(format!(
                "'{}'. Available tools: {}",
                request.name,
                self.names().join(", ")
            ));
            return ToolResult::failure(request, ToolFailure::from(err));
        };

        let args = match tool.schema().validate(tool.name(), &request.arguments) {
            Ok(args) => args,
            Err(err) => {
                warn!("Rejected arguments for '{}': {}", request.name, err);
                return ToolResult::failure(request, ToolFailure::from(err));
            }
        };

        let outcome = match tokio::time::timeout(timeout, tool.invoke(args)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::ToolTimeout(timeout)),
        };

        match outcome {
            Ok(output) => {
                info!("Tool '{}' succeeded", request.name);
                debug!("Output of call {}: {}", request.id, output);
                ToolResult::success(request, output)
            }
            Err(err) => {
                warn!("Tool '{}' failed: {}", request.name, err);
                ToolResult::failure(request, ToolFailure::from(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sdk::tool::{ParamType, ToolArgs, ToolSchema};
    use sdk::types::FailureKind;
    use serde_json::{json, Value};

    struct SleepyTool {
        schema: ToolSchema,
    }

    #[async_trait]
    impl Tool for SleepyTool {
        fn name(&self) -> &str {
            "sleepy"
        }

        fn description(&self) -> &str {
            "Sleeps longer than any sane timeout"
        }

        fn schema(&self) -> &ToolSchema {
            &self.schema
        }

        async fn invoke(&self, _args: ToolArgs) -> Result<Value, EngineError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Value::Null)
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::empty();
        registry.register(Arc::new(MathTool::new())).unwrap();
        registry.register(Arc::new(TextAnalysisTool::new())).unwrap();
        registry
    }

    fn request(name: &str, args: Value) -> ToolCallRequest {
        ToolCallRequest::from_json("call_1", name, args)
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = registry();
        let err = registry.register(Arc::new(MathTool::new())).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateTool(ref n) if n == "math_calculator"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_catalogue_is_in_registration_order() {
        let registry = registry();
        let names: Vec<String> = registry.catalogue().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["math_calculator", "analyze_text"]);
        assert_eq!(registry.catalogue(), registry.catalogue());
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let result = registry()
            .resolve(
                &request("math_calculator", json!({"expression": "(234 * 12) + 98"})),
                Duration::from_secs(1),
            )
            .await;
        assert_eq!(result.output(), Some(&json!(2906)));
        assert_eq!(result.call_id, "call_1");
    }

    #[tokio::test]
    async fn test_resolve_unknown_tool() {
        let result = registry()
            .resolve(&request("teleport", json!({})), Duration::from_secs(1))
            .await;
        let failure = result.error().unwrap();
        assert_eq!(failure.kind, FailureKind::NotFound);
        assert!(failure.message.contains("math_calculator"));
    }

    #[tokio::test]
    async fn test_resolve_invalid_arguments() {
        let registry = registry();
        for args in [json!({}), json!({"expression": 5}), json!({"expression": "1", "x": 1})] {
            let result = registry
                .resolve(&request("math_calculator", args), Duration::from_secs(1))
                .await;
            assert_eq!(result.error().unwrap().kind, FailureKind::InvalidArguments);
        }
    }

    #[tokio::test]
    async fn test_resolve_evaluation_error() {
        let result = registry()
            .resolve(
                &request("math_calculator", json!({"expression": "1 / 0"})),
                Duration::from_secs(1),
            )
            .await;
        assert_eq!(result.error().unwrap().kind, FailureKind::Evaluation);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_timeout() {
        let mut registry = ToolRegistry::empty();
        registry
            .register(Arc::new(SleepyTool {
                schema: ToolSchema::new().optional("note", ParamType::String, "ignored"),
            }))
            .unwrap();

        let result = registry
            .resolve(&request("sleepy", json!({})), Duration::from_secs(2))
            .await;
        assert_eq!(result.error().unwrap().kind, FailureKind::Timeout);
    }
}
