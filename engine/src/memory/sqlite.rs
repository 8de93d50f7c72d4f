//! Local SQLite memory backend
//!
//! Each completed turn is stored as one document and indexed with FTS5.
//! Search ranks by bm25 within the requesting user's documents only.

use async_trait::async_trait;
use sdk::errors::EngineError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{ConnectOptions, Row};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use super::{MemorySnippet, MemoryStore};
use crate::turn::Turn;

pub struct SqliteStore {
    pool: SqlitePool,
}

fn db_err(context: &str) -> impl Fn(sqlx::Error) -> EngineError + '_ {
    move |e| EngineError::Database(format!("{}: {}", context, e))
}

impl SqliteStore {
    /// Open (creating if needed) the memory database at `db_path`.
    ///
    /// Uses WAL journaling and applies the schema on every open; the schema
    /// statements are idempotent.
    pub async fn open(db_path: &Path) -> Result<Self, EngineError> {
        info!("Opening memory database at: {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let connection_string = format!("sqlite:{}", db_path.display());
        let options = SqliteConnectOptions::from_str(&connection_string)
            .map_err(db_err("Invalid database path"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(db_err("Failed to connect to database"))?;

        sqlx::raw_sql(include_str!("../../migrations/001_memories.sql"))
            .execute(&pool)
            .await
            .map_err(db_err("Failed to execute migration 001_memories.sql"))?;

        debug!("Memory database ready");
        Ok(Self { pool })
    }

    /// Number of documents stored for `user_id`
    pub async fn count(&self, user_id: &str) -> Result<i64, EngineError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM memories WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Failed to count memories"))
    }

    /// Checkpoint the WAL and close all connections
    pub async fn close(self) -> Result<(), EngineError> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to flush WAL"))?;
        self.pool.close().await;
        Ok(())
    }
}

/// Turn free text into an FTS5 query that cannot be a syntax error.
///
/// Every word becomes a quoted term and terms are OR-ed, so operators and
/// punctuation in user input are never interpreted. Returns `None` when no
/// searchable term remains.
pub fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2)
        .map(|w| format!("\"{}\"", w.to_lowercase()))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

#[async_trait]
impl MemoryStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn search(
        &self,
        query: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MemorySnippet>, EngineError> {
        let Some(match_expr) = fts_query(query) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            r#"
            SELECT m.content AS content, m.user_id AS user_id, bm25(memories_fts) AS rank
            FROM memories_fts
            JOIN memories m ON m.id = memories_fts.rowid
            WHERE memories_fts MATCH ? AND m.user_id = ?
            ORDER BY rank
            LIMIT ?
            "#,
        )
        .bind(match_expr)
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to execute FTS query on memories_fts"))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let rank: f64 = row.get("rank");
                MemorySnippet {
                    text: row.get("content"),
                    // bm25 is lower-is-better and negative for matches
                    score: -rank,
                    user_id: row.get("user_id"),
                }
            })
            .collect())
    }

    async fn add(&self, turn: &Turn, user_id: &str) -> Result<(), EngineError> {
        sqlx::query(
            "INSERT OR IGNORE INTO memories (turn_id, user_id, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&turn.id)
        .bind(user_id)
        .bind(turn.transcript())
        .bind(turn.timestamp.timestamp())
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to insert memory"))?;
        Ok(())
    }
}
