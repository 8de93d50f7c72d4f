use proptest::prelude::*;
use sdk::errors::{EngineError, RecallErrorExt};
use sdk::tool::{ParamType, ToolSchema};
use sdk::types::{FailureKind, ToolCallRequest, ToolFailure, ToolResult};
use serde_json::{json, Map, Value};

// Every error variant yields a non-empty, static hint that never echoes the
// raw payload back to the user.
proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "[a-zA-Z0-9_/.]{8,40}") {
        let errs = vec![
            EngineError::Config(error_str.clone()),
            EngineError::Evaluation(error_str.clone()),
            EngineError::ToolNotFound(error_str.clone()),
            EngineError::ToolArgument { tool: error_str.clone(), reason: error_str.clone() },
            EngineError::ToolExecution(error_str.clone()),
            EngineError::DuplicateTool(error_str.clone()),
            EngineError::MemoryUnavailable(error_str.clone()),
            EngineError::OracleUnavailable(error_str.clone()),
            EngineError::Network(error_str.clone()),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            prop_assert!(!hint.contains(&error_str));
        }
    }
}

// A result is always exactly one of success or failure.
proptest! {
    #[test]
    fn test_tool_result_union_is_exhaustive(
        id in "call_[a-z0-9]{4,12}",
        name in "[a-z_]{3,20}",
        succeed in any::<bool>(),
        n in any::<i64>(),
    ) {
        let request = ToolCallRequest::new(id.clone(), name.clone(), Map::new());
        let result = if succeed {
            ToolResult::success(&request, json!(n))
        } else {
            ToolResult::failure(&request, ToolFailure::new(FailureKind::Execution, "boom"))
        };

        prop_assert_eq!(result.output().is_some(), result.is_success());
        prop_assert_eq!(result.error().is_some(), !result.is_success());
        prop_assert_eq!(result.call_id, id);
        prop_assert_eq!(result.tool_name, name);
    }
}

// Validation never lets a wrongly-typed required argument through.
proptest! {
    #[test]
    fn test_schema_rejects_non_string_for_string_param(n in any::<i64>(), b in any::<bool>()) {
        let schema = ToolSchema::new().required("expression", ParamType::String, "expr");

        for value in [json!(n), json!(b), json!([1, 2]), json!({"a": 1})] {
            let mut raw = Map::new();
            raw.insert("expression".to_string(), value);
            let is_argument_error = matches!(
                schema.validate("math_calculator", &raw),
                Err(EngineError::ToolArgument { .. })
            );
            prop_assert!(is_argument_error);
        }
    }

    #[test]
    fn test_schema_accepts_any_integer_for_integer_param(n in any::<i64>()) {
        let schema = ToolSchema::new().required("days", ParamType::Integer, "days");
        let mut raw = Map::new();
        raw.insert("days".to_string(), Value::from(n));
        let args = schema.validate("date_utility_tool", &raw).unwrap();
        prop_assert_eq!(args.i64("days").unwrap(), n);
    }
}
