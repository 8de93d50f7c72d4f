//! Long-term memory gateway
//!
//! Mediates between the session and a user-scoped memory store. The gateway
//! owns the policy (short-query skip, snippet cap, time bound) and reports
//! degradation as a value; backends only know how to search and add.
//!
//! Memory is an enhancement. Nothing here ever fails a turn: an unreachable,
//! slow or unconfigured store yields [`Retrieval::Unavailable`] on reads and
//! [`StoreOutcome::Dropped`] on writes.

pub mod mem0;
pub mod sqlite;

pub use mem0::Mem0Store;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{Config, MemoryBackend, MemoryConfig};
use crate::secrets::Credentials;
use crate::turn::Turn;

/// A retrieved fragment of prior user-scoped history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySnippet {
    pub text: String,

    /// Backend relevance score; higher is more relevant
    pub score: f64,

    pub user_id: String,
}

/// Storage backend contract
#[async_trait]
pub trait MemoryStore: Send + Sync {
    fn name(&self) -> &str;

    /// Snippets for `user_id` relevant to `query`, most relevant first
    async fn search(
        &self,
        query: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MemorySnippet>, EngineError>;

    /// Persist a completed turn for `user_id`
    async fn add(&self, turn: &Turn, user_id: &str) -> Result<(), EngineError>;
}

/// Result of a retrieval attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    /// The query was too short; the store was not consulted
    Skipped,

    /// The store could not be consulted
    Unavailable(String),

    /// The store answered (possibly with nothing)
    Retrieved(Vec<MemorySnippet>),
}

impl Retrieval {
    pub fn snippets(&self) -> &[MemorySnippet] {
        match self {
            Retrieval::Retrieved(snippets) => snippets,
            _ => &[],
        }
    }
}

/// Result of a write attempt
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome {
    Stored,
    Dropped(String),
}

pub struct MemoryGateway {
    store: Option<Arc<dyn MemoryStore>>,
    disabled_reason: String,
    min_query_chars: usize,
    max_snippets: usize,
    timeout: Duration,
}

impl MemoryGateway {
    pub fn new(store: Arc<dyn MemoryStore>, config: &MemoryConfig) -> Self {
        Self {
            store: Some(store),
            disabled_reason: String::new(),
            min_query_chars: config.min_query_chars,
            max_snippets: config.max_snippets,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Gateway with no backend; every call degrades with `reason`
    pub fn disabled(reason: impl Into<String>, config: &MemoryConfig) -> Self {
        Self {
            store: None,
            disabled_reason: reason.into(),
            min_query_chars: config.min_query_chars,
            max_snippets: config.max_snippets,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Open the backend selected in configuration.
    ///
    /// A backend that cannot be set up (missing Mem0 key, unopenable
    /// database) leaves memory disabled with a warning rather than failing.
    pub async fn from_config(config: &Config, credentials: &Credentials) -> Self {
        let memory = &config.memory;
        match memory.backend {
            MemoryBackend::Disabled => {
                info!("Long-term memory disabled by configuration");
                Self::disabled("memory is disabled in configuration", memory)
            }
            MemoryBackend::Mem0 => match &credentials.mem0_api_key {
                Some(key) => match Mem0Store::new(&memory.mem0, key.clone()) {
                    Ok(store) => {
                        info!("Long-term memory backed by Mem0");
                        Self::new(Arc::new(store), memory)
                    }
                    Err(e) => {
                        warn!("Mem0 client could not be created, memory disabled: {}", e);
                        Self::disabled(e.to_string(), memory)
                    }
                },
                None => {
                    warn!("MEM0_API_KEY not set; long-term memory disabled");
                    Self::disabled("MEM0_API_KEY is not configured", memory)
                }
            },
            MemoryBackend::Sqlite => {
                let path = config.core.data_dir.join("memory.db");
                match SqliteStore::open(&path).await {
                    Ok(store) => {
                        info!("Long-term memory backed by {}", path.display());
                        Self::new(Arc::new(store), memory)
                    }
                    Err(e) => {
                        warn!("Memory database unavailable, memory disabled: {}", e);
                        Self::disabled(e.to_string(), memory)
                    }
                }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn backend_name(&self) -> &str {
        self.store.as_ref().map(|s| s.name()).unwrap_or("none")
    }

    /// Retrieve snippets relevant to `query` for `user_id`
    pub async fn retrieve(&self, query: &str, user_id: &str) -> Retrieval {
        if query.trim().chars().count() < self.min_query_chars {
            debug!("Query shorter than {} chars, skipping memory", self.min_query_chars);
            return Retrieval::Skipped;
        }

        let Some(store) = &self.store else {
            debug!("Memory retrieval unavailable: {}", self.disabled_reason);
            return Retrieval::Unavailable(self.disabled_reason.clone());
        };

        let search = store.search(query.trim(), user_id, self.max_snippets);
        match tokio::time::timeout(self.timeout, search).await {
            Ok(Ok(mut snippets)) => {
                snippets.truncate(self.max_snippets);
                info!("Retrieved {} memory snippets from {}", snippets.len(), store.name());
                Retrieval::Retrieved(snippets)
            }
            Ok(Err(e)) => {
                warn!("Memory retrieval failed: {}", e);
                Retrieval::Unavailable(e.to_string())
            }
            Err(_) => {
                warn!("Memory retrieval timed out after {:?}", self.timeout);
                Retrieval::Unavailable(format!("timed out after {:?}", self.timeout))
            }
        }
    }

    /// Write a completed turn back for `user_id`
    pub async fn store(&self, turn: &Turn, user_id: &str) -> StoreOutcome {
        let Some(store) = &self.store else {
            debug!("Memory write dropped: {}", self.disabled_reason);
            return StoreOutcome::Dropped(self.disabled_reason.clone());
        };

        match tokio::time::timeout(self.timeout, store.add(turn, user_id)).await {
            Ok(Ok(())) => {
                debug!("Stored turn {} in {}", turn.id, store.name());
                StoreOutcome::Stored
            }
            Ok(Err(e)) => {
                warn!("Memory write dropped: {}", e);
                StoreOutcome::Dropped(e.to_string())
            }
            Err(_) => {
                warn!("Memory write timed out after {:?}", self.timeout);
                StoreOutcome::Dropped(format!("timed out after {:?}", self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStore {
        searches: AtomicUsize,
        snippets: Vec<MemorySnippet>,
        fail: bool,
    }

    impl CountingStore {
        fn new(count: usize) -> Self {
            let snippets = (0..count)
                .map(|i| MemorySnippet {
                    text: format!("fact {}", i),
                    score: 1.0 - i as f64 * 0.1,
                    user_id: "alice".to_string(),
                })
                .collect();
            Self {
                searches: AtomicUsize::new(0),
                snippets,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl MemoryStore for CountingStore {
        fn name(&self) -> &str {
            "counting"
        }

        async fn search(
            &self,
            _query: &str,
            _user_id: &str,
            _limit: usize,
        ) -> Result<Vec<MemorySnippet>, EngineError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EngineError::MemoryUnavailable("connection refused".to_string()));
            }
            Ok(self.snippets.clone())
        }

        async fn add(&self, _turn: &Turn, _user_id: &str) -> Result<(), EngineError> {
            if self.fail {
                return Err(EngineError::MemoryUnavailable("connection refused".to_string()));
            }
            Ok(())
        }
    }

    fn turn() -> Turn {
        Turn::new("remember me", "ok", vec![], 0, false)
    }

    #[tokio::test]
    async fn test_short_query_never_reaches_store() {
        let store = Arc::new(CountingStore::new(3));
        let gateway = MemoryGateway::new(store.clone(), &MemoryConfig::default());

        assert_eq!(gateway.retrieve("hi", "alice").await, Retrieval::Skipped);
        assert_eq!(gateway.retrieve("  abc  ", "alice").await, Retrieval::Skipped);
        assert_eq!(store.searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_snippets_capped_in_backend_order() {
        let store = Arc::new(CountingStore::new(8));
        let gateway = MemoryGateway::new(store.clone(), &MemoryConfig::default());

        let retrieval = gateway.retrieve("what is my name", "alice").await;
        let texts: Vec<&str> = retrieval.snippets().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["fact 0", "fact 1", "fact 2", "fact 3", "fact 4"]);
        assert_eq!(store.searches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_degrades() {
        let mut failing = CountingStore::new(1);
        failing.fail = true;
        let gateway = MemoryGateway::new(Arc::new(failing), &MemoryConfig::default());

        assert!(matches!(
            gateway.retrieve("what is my name", "alice").await,
            Retrieval::Unavailable(_)
        ));
        assert!(matches!(gateway.store(&turn(), "alice").await, StoreOutcome::Dropped(_)));
    }

    #[tokio::test]
    async fn test_disabled_gateway_degrades() {
        let gateway = MemoryGateway::disabled("no key", &MemoryConfig::default());
        assert!(!gateway.is_enabled());
        assert_eq!(gateway.backend_name(), "none");
        assert_eq!(
            gateway.retrieve("what is my name", "alice").await,
            Retrieval::Unavailable("no key".to_string())
        );
        assert_eq!(
            gateway.store(&turn(), "alice").await,
            StoreOutcome::Dropped("no key".to_string())
        );
    }

    #[tokio::test]
    async fn test_successful_store() {
        let gateway = MemoryGateway::new(Arc::new(CountingStore::new(0)), &MemoryConfig::default());
        assert_eq!(gateway.store(&turn(), "alice").await, StoreOutcome::Stored);
        assert_eq!(
            gateway.retrieve("anything at all", "alice").await,
            Retrieval::Retrieved(vec![])
        );
    }
}
