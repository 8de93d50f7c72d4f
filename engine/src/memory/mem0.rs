//! Mem0 hosted memory backend

use async_trait::async_trait;
use sdk::errors::EngineError;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{MemorySnippet, MemoryStore};
use crate::config::Mem0Config;
use crate::secrets::{scrub_secrets, SecretString};
use crate::turn::Turn;

pub struct Mem0Store {
    base_url: String,
    api_key: SecretString,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct Mem0Memory {
    memory: String,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    user_id: Option<String>,
}

/// Search responses come either as a bare array or wrapped in `results`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Bare(Vec<Mem0Memory>),
    Wrapped { results: Vec<Mem0Memory> },
}

impl Mem0Store {
    pub fn new(config: &Mem0Config, api_key: SecretString) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| EngineError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    async fn post(&self, path: &str, body: Value) -> Result<reqwest::Response, EngineError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key.expose()))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::MemoryUnavailable(scrub_secrets(&e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let text = scrub_secrets(&response.text().await.unwrap_or_default());
            return Err(EngineError::MemoryUnavailable(format!(
                "Mem0 API error ({}): {}",
                status, text
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl MemoryStore for Mem0Store {
    fn name(&self) -> &str {
        "mem0"
    }

    async fn search(
        &self,
        query: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MemorySnippet>, EngineError> {
        let response = self
            .post(
                "/v1/memories/search/",
                json!({"query": query, "user_id": user_id, "limit": limit}),
            )
            .await?;

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            EngineError::MemoryUnavailable(format!("Unexpected Mem0 response: {}", e))
        })?;

        let memories = match parsed {
            SearchResponse::Bare(items) => items,
            SearchResponse::Wrapped { results } => results,
        };
        debug!("Mem0 returned {} memories", memories.len());

        Ok(memories
            .into_iter()
            .map(|m| MemorySnippet {
                text: m.memory,
                score: m.score.unwrap_or(0.0),
                user_id: m.user_id.unwrap_or_else(|| user_id.to_string()),
            })
            .collect())
    }

    async fn add(&self, turn: &Turn, user_id: &str) -> Result<(), EngineError> {
        let body = json!({
            "messages": [
                {"role": "user", "content": turn.user_input},
                {"role": "assistant", "content": turn.answer},
            ],
            "user_id": user_id,
            "metadata": {
                "turn_id": turn.id,
                "tools": turn.tools_used(),
                "incomplete": turn.incomplete,
            },
        });
        self.post("/v1/memories/", body).await?;
        Ok(())
    }
}
