use super::{Decision, DecisionOracle, LLMError, Message, MessageRole};
use crate::config::GeminiConfig;
use crate::secrets::{scrub_secrets, SecretString};
use async_trait::async_trait;
use sdk::tool::ToolSpec;
use sdk::types::ToolCallRequest;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Google Gemini `generateContent` with native function calling
pub struct GeminiOracle {
    config: GeminiConfig,
    api_key: SecretString,
    client: reqwest::Client,
}

impl GeminiOracle {
    pub fn new(config: GeminiConfig, api_key: SecretString) -> Self {
        Self {
            config,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Build the request body for a conversation and catalogue
    pub fn build_payload(&self, messages: &[Message], tools: &[ToolSpec]) -> Value {
        let mut contents: Vec<Value> = Vec::new();
        let mut system_parts = Vec::new();

        for msg in messages {
            match msg.role {
                MessageRole::System => {
                    system_parts.push(json!({"text": msg.content}));
                }
                MessageRole::User => {
                    contents.push(json!({
                        "role": "user",
                        "parts": [{"text": msg.content}]
                    }));
                }
                MessageRole::Assistant => {
                    let mut parts = Vec::new();
                    if !msg.content.is_empty() {
                        parts.push(json!({"text": msg.content}));
                    }
                    for call in &msg.tool_calls {
                        parts.push(json!({
                            "functionCall": {"name": call.name, "args": call.arguments}
                        }));
                    }
                    contents.push(json!({"role": "model", "parts": parts}));
                }
                MessageRole::Tool => {
                    let part = json!({
                        "functionResponse": {
                            "name": msg.name.as_deref().unwrap_or_default(),
                            "response": {"content": msg.content}
                        }
                    });
                    // Responses to one batch travel together in a single turn
                    let previous_is_batch = contents.last().is_some_and(|c| {
                        c["role"] == "user"
                            && c["parts"]
                                .as_array()
                                .and_then(|p| p.first())
                                .is_some_and(|p| p.get("functionResponse").is_some())
                    });
                    match contents.last_mut().and_then(|c| c["parts"].as_array_mut()) {
                        Some(parts) if previous_is_batch => parts.push(part),
                        _ => contents.push(json!({"role": "user", "parts": [part]})),
                    }
                }
            }
        }

        let mut payload = Map::new();
        payload.insert("contents".to_string(), json!(contents));

        if !system_parts.is_empty() {
            payload.insert("systemInstruction".to_string(), json!({"parts": system_parts}));
        }

        if !tools.is_empty() {
            let declarations: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.schema.to_json_schema(),
                    })
                })
                .collect();
            payload.insert(
                "tools".to_string(),
                json!([{"functionDeclarations": declarations}]),
            );
        }

        payload.insert(
            "generationConfig".to_string(),
            json!({
                "temperature": self.config.temperature,
                "topP": self.config.top_p,
                "topK": self.config.top_k,
                "maxOutputTokens": self.config.max_output_tokens,
            }),
        );

        Value::Object(payload)
    }
}

/// Read a `generateContent` response body as a decision
pub fn parse_decision(data: &Value) -> super::Result<Decision> {
    let candidate = data
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| {
            let reason = data
                .pointer("/promptFeedback/blockReason")
                .and_then(Value::as_str)
                .unwrap_or("no candidates");
            LLMError::Protocol(format!("No candidates in response ({})", reason))
        })?;

    let parts = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            let reason = candidate
                .get("finishReason")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            LLMError::Protocol(format!("No content in candidate (finish reason {})", reason))
        })?;

    let mut text = String::new();
    let mut calls = Vec::new();

    for part in parts {
        if let Some(call) = part.get("functionCall") {
            let name = call
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| LLMError::Protocol("functionCall without a name".to_string()))?;
            let id = call
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4()));
            let args = call.get("args").cloned().unwrap_or_else(|| json!({}));
            calls.push(ToolCallRequest::from_json(id, name, args));
        } else if let Some(t) = part.get("text").and_then(Value::as_str) {
            text.push_str(t);
        }
    }

    if !calls.is_empty() {
        return Decision::tool_calls(calls);
    }

    let text = text.trim();
    if text.is_empty() {
        return Err(LLMError::Protocol("Empty response".to_string()));
    }
    Ok(Decision::FinalAnswer(text.to_string()))
}

#[async_trait]
impl DecisionOracle for GeminiOracle {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn decide(&self, messages: &[Message], tools: &[ToolSpec]) -> super::Result<Decision> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let payload = self.build_payload(messages, tools);
        debug!("Gemini request with {} messages, {} tools", messages.len(), tools.len());

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", self.api_key.expose())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else {
                    LLMError::NetworkError(scrub_secrets(&e.to_string()))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = scrub_secrets(&response.text().await.unwrap_or_default());

            return Err(match status.as_u16() {
                400 | 404 => LLMError::InvalidRequest(text),
                429 => LLMError::RateLimitExceeded,
                401 | 403 => LLMError::AuthenticationFailed(text),
                _ => LLMError::ProviderUnavailable(format!(
                    "Gemini API error ({}): {}",
                    status, text
                )),
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let decision = parse_decision(&data)?;
        debug!("Gemini decision: {:?}", decision);
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::tool::{ParamType, ToolSchema};
    use sdk::types::ToolResult;

    fn oracle() -> GeminiOracle {
        GeminiOracle::new(GeminiConfig::default(), SecretString::from("test-key"))
    }

    fn catalogue() -> Vec<ToolSpec> {
        vec![ToolSpec {
            name: "math_calculator".to_string(),
            description: "math".to_string(),
            schema: ToolSchema::new().required("expression", ParamType::String, "expr"),
        }]
    }

    #[test]
    fn test_payload_shapes_roles_and_tools() {
        let request = ToolCallRequest::from_json("c1", "math_calculator", json!({"expression": "1+1"}));
        let request2 = ToolCallRequest::from_json("c2", "math_calculator", json!({"expression": "2+2"}));
        let messages = vec![
            Message::system("be helpful"),
            Message::user("add"),
            Message::tool_calls(vec![request.clone(), request2.clone()]),
            Message::tool_result(&ToolResult::success(&request, json!(2))),
            Message::tool_result(&ToolResult::success(&request2, json!(4))),
        ];

        let payload = oracle().build_payload(&messages, &catalogue());

        assert_eq!(payload["systemInstruction"]["parts"][0]["text"], "be helpful");
        let contents = payload["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][1]["functionCall"]["args"]["expression"], "2+2");
        assert_eq!(contents[2]["parts"].as_array().unwrap().len(), 2);
        assert_eq!(contents[2]["parts"][0]["functionResponse"]["response"]["content"], "2");
        assert_eq!(
            payload["tools"][0]["functionDeclarations"][0]["parameters"]["required"][0],
            "expression"
        );
        assert_eq!(payload["generationConfig"]["topK"], 40);
        assert_eq!(payload["generationConfig"]["maxOutputTokens"], 512);
    }

    #[test]
    fn test_payload_without_tools_omits_declarations() {
        let payload = oracle().build_payload(&[Message::user("hi")], &[]);
        assert!(payload.get("tools").is_none());
        assert!(payload.get("systemInstruction").is_none());
    }

    #[test]
    fn test_parse_function_calls() {
        let data = json!({"candidates": [{"content": {"role": "model", "parts": [
            {"functionCall": {"name": "math_calculator", "args": {"expression": "3 * 499"}}},
            {"functionCall": {"name": "date_utility_tool", "args": {"days": 7}}}
        ]}}]});
        match parse_decision(&data).unwrap() {
            Decision::ToolCalls(calls) => {
                assert_eq!(calls.len(), 2);
                assert_eq!(calls[0].name, "math_calculator");
                assert_eq!(calls[1].arguments["days"], 7);
                assert_ne!(calls[0].id, calls[1].id);
            }
            other => panic!("expected tool calls, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_text_answer() {
        let data = json!({"candidates": [{"content": {"parts": [{"text": "The result "}, {"text": "is 2906."}]}}]});
        assert_eq!(
            parse_decision(&data).unwrap(),
            Decision::FinalAnswer("The result is 2906.".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_empty_and_blocked() {
        let empty = json!({"candidates": [{"content": {"parts": [{"text": "  "}]}}]});
        assert!(matches!(parse_decision(&empty), Err(LLMError::Protocol(_))));

        let blocked = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        match parse_decision(&blocked) {
            Err(LLMError::Protocol(msg)) => assert!(msg.contains("SAFETY")),
            other => panic!("expected protocol error, got {:?}", other),
        }

        let no_content = json!({"candidates": [{"finishReason": "MAX_TOKENS"}]});
        assert!(matches!(parse_decision(&no_content), Err(LLMError::Protocol(_))));
    }
}
