//! Text statistics Core Tool
//!
//! Word and character counts plus a keyword-score sentiment label.

use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::tool::{ParamType, Tool, ToolArgs, ToolSchema};
use serde::Serialize;
use serde_json::Value;

const POSITIVE_WORDS: [&str; 5] = ["good", "great", "excellent", "happy", "love"];
const NEGATIVE_WORDS: [&str; 5] = ["bad", "poor", "sad", "hate", "terrible"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextAnalysis {
    pub word_count: usize,
    pub character_count: usize,
    pub sentiment: &'static str,
}

/// Analyze `text`. Each word scores +1 or -1 when it (lowercased, stripped of
/// surrounding punctuation) is a sentiment keyword.
pub fn analyze(text: &str) -> TextAnalysis {
    let words: Vec<&str> = text.split_whitespace().collect();

    let score: i64 = words
        .iter()
        .map(|w| {
            let word = w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if POSITIVE_WORDS.contains(&word.as_str()) {
                1
            } else if NEGATIVE_WORDS.contains(&word.as_str()) {
                -1
            } else {
                0
            }
        })
        .sum();

    let sentiment = match score {
        s if s > 0 => "Positive",
        s if s < 0 => "Negative",
        _ => "Neutral",
    };

    TextAnalysis {
        word_count: words.len(),
        character_count: text.chars().count(),
        sentiment,
    }
}

pub struct TextAnalysisTool {
    schema: ToolSchema,
}

impl TextAnalysisTool {
    pub fn new() -> Self {
        Self {
            schema: ToolSchema::new().required("text", ParamType::String, "Text to analyze"),
        }
    }
}

impl Default for TextAnalysisTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for TextAnalysisTool {
    fn name(&self) -> &str {
        "analyze_text"
    }

    fn description(&self) -> &str {
        "Count words and characters in a text and classify its sentiment as Positive, Negative or Neutral."
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn invoke(&self, args: ToolArgs) -> Result<Value, EngineError> {
        let text = args.str("text")?;
        serde_json::to_value(analyze(text))
            .map_err(|e| EngineError::ToolExecution(format!("Failed to encode analysis: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let analysis = analyze("The  quick brown fox");
        assert_eq!(analysis.word_count, 4);
        assert_eq!(analysis.character_count, 20);
        assert_eq!(analysis.sentiment, "Neutral");
    }

    #[test]
    fn test_sentiment_keywords() {
        assert_eq!(analyze("I love this, it is GREAT!").sentiment, "Positive");
        assert_eq!(analyze("terrible service and poor food").sentiment, "Negative");
        assert_eq!(analyze("good but bad").sentiment, "Neutral");
    }

    #[test]
    fn test_keywords_match_through_punctuation() {
        assert_eq!(analyze("What a great, wonderful day").sentiment, "Positive");
        assert_eq!(analyze("\"Terrible.\"").sentiment, "Negative");
        assert_eq!(analyze("goodness").sentiment, "Neutral");
    }

    #[test]
    fn test_empty_text() {
        let analysis = analyze("");
        assert_eq!(analysis.word_count, 0);
        assert_eq!(analysis.character_count, 0);
        assert_eq!(analysis.sentiment, "Neutral");
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        assert_eq!(analyze("café").character_count, 4);
    }
}
