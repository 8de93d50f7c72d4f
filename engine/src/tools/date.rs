//! Calendar offset Core Tool

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use sdk::errors::EngineError;
use sdk::tool::{ParamType, Tool, ToolArgs, ToolSchema};
use serde_json::Value;
use std::sync::Arc;

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Computes the ISO date a number of days away from today.
pub struct DateTool {
    schema: ToolSchema,
    today: Clock,
}

impl DateTool {
    /// Date tool reading the local calendar date
    pub fn new() -> Self {
        Self::with_clock(Arc::new(|| Local::now().date_naive()))
    }

    /// Date tool with an injected notion of "today"
    pub fn with_clock(today: Clock) -> Self {
        Self {
            schema: ToolSchema::new().required(
                "days",
                ParamType::Integer,
                "Number of days from today; negative values go back in time",
            ),
            today,
        }
    }

    /// `today + days`, or an execution error outside the calendar range
    pub fn offset(&self, days: i64) -> Result<NaiveDate, EngineError> {
        let today = (self.today)();
        let shifted = if days >= 0 {
            today.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            today.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        shifted.ok_or_else(|| {
            EngineError::ToolExecution(format!("{} days from {} is out of range", days, today))
        })
    }
}

impl Default for DateTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for DateTool {
    fn name(&self) -> &str {
        "date_utility_tool"
    }

    fn description(&self) -> &str {
        "Compute the calendar date (YYYY-MM-DD) a given number of days from today."
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn invoke(&self, args: ToolArgs) -> Result<Value, EngineError> {
        let days = args.i64("days")?;
        let date = self.offset(days)?;
        Ok(Value::String(date.format("%Y-%m-%d").to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn fixed() -> DateTool {
        DateTool::with_clock(Arc::new(|| NaiveDate::from_ymd_opt(2024, 2, 25).unwrap()))
    }

    fn args(days: Value) -> ToolArgs {
        let mut raw = Map::new();
        raw.insert("days".to_string(), days);
        fixed().schema().validate("date_utility_tool", &raw).unwrap()
    }

    #[tokio::test]
    async fn test_forward_across_leap_day() {
        assert_eq!(fixed().invoke(args(json!(7))).await.unwrap(), json!("2024-03-03"));
    }

    #[tokio::test]
    async fn test_backward_and_zero() {
        assert_eq!(fixed().invoke(args(json!(-25))).await.unwrap(), json!("2024-01-31"));
        assert_eq!(fixed().invoke(args(json!(0))).await.unwrap(), json!("2024-02-25"));
    }

    #[tokio::test]
    async fn test_integral_float_accepted() {
        assert_eq!(fixed().invoke(args(json!(1.0))).await.unwrap(), json!("2024-02-26"));
    }

    #[test]
    fn test_out_of_range_is_execution_error() {
        let err = fixed().offset(i64::MAX).unwrap_err();
        assert!(matches!(err, EngineError::ToolExecution(_)));
        assert!(fixed().offset(i64::MIN).is_err());
    }
}
