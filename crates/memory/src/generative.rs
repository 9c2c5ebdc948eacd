//! Memory for generative agents.
//!
//! Supplies two prompt variables to a chain:
//! - `relevant_memories`, from searching the backend with each string in the
//!   `queries` input;
//! - `most_recent_memories`, filled newest-first until the prompt tokens
//!   already consumed (the `most_recent_memories_token` input) plus the
//!   memories' own tokens would exceed `max_tokens_limit`.
//!
//! Whatever a chain run puts under `add_memory` in its outputs is stored.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chainkit_core::chain::ChainValues;
use chainkit_core::error::MemoryError;
use chainkit_core::memory::{AgentMemory, MemoryBackend, MemoryEntry, MemoryQuery};
use chainkit_core::token::estimate_tokens;
use chrono::{DateTime, Utc};
use tracing::debug;

pub const QUERIES_KEY: &str = "queries";
pub const RELEVANT_MEMORIES_KEY: &str = "relevant_memories";
pub const MOST_RECENT_MEMORIES_KEY: &str = "most_recent_memories";
pub const MOST_RECENT_MEMORIES_TOKEN_KEY: &str = "most_recent_memories_token";
pub const ADD_MEMORY_KEY: &str = "add_memory";

/// Default token budget shared between the prompt and recent memories.
pub const DEFAULT_MAX_TOKENS_LIMIT: usize = 1200;

/// Upper bound on memories scanned when filling the recent window.
const RECENT_SCAN_LIMIT: usize = 256;

pub struct GenerativeAgentMemory {
    backend: Arc<dyn MemoryBackend>,
    max_tokens_limit: usize,
    search_limit: usize,
}

impl GenerativeAgentMemory {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self {
            backend,
            max_tokens_limit: DEFAULT_MAX_TOKENS_LIMIT,
            search_limit: 10,
        }
    }

    pub fn with_max_tokens_limit(mut self, limit: usize) -> Self {
        self.max_tokens_limit = limit;
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn backend(&self) -> &Arc<dyn MemoryBackend> {
        &self.backend
    }

    async fn relevant_memories(&self, queries: &[String]) -> Result<String, MemoryError> {
        let mut seen = HashSet::new();
        let mut lines = Vec::new();

        for query in queries {
            let mut q = MemoryQuery::text(query.clone());
            q.limit = self.search_limit;
            for hit in self.backend.search(q).await? {
                if seen.insert(hit.id.clone()) {
                    lines.push(format!("- {}", hit.content));
                }
            }
        }

        debug!(queries = queries.len(), hits = lines.len(), "Fetched relevant memories");
        Ok(lines.join("\n"))
    }

    async fn most_recent_memories(&self, consumed_tokens: usize) -> Result<String, MemoryError> {
        let mut kept: Vec<MemoryEntry> = Vec::new();
        let mut total = 0usize;

        for entry in self.backend.recent(RECENT_SCAN_LIMIT).await? {
            let tokens = estimate_tokens(&entry.content);
            if consumed_tokens + total + tokens > self.max_tokens_limit {
                break;
            }
            total += tokens;
            kept.push(entry);
        }

        kept.reverse();
        Ok(kept
            .iter()
            .map(|e| e.content.as_str())
            .collect::<Vec<_>>()
            .join("; "))
    }
}

fn queries_from(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(s) => vec![s.clone()],
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl AgentMemory for GenerativeAgentMemory {
    async fn add_memory(
        &self,
        content: &str,
        now: Option<DateTime<Utc>>,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), MemoryError> {
        let mut entry = MemoryEntry::new(content, now.unwrap_or_else(Utc::now));
        entry.metadata = metadata;
        let id = self.backend.store(entry).await?;
        debug!(id = %id, "Stored memory");
        Ok(())
    }

    fn relevant_memories_key(&self) -> &str {
        RELEVANT_MEMORIES_KEY
    }

    fn most_recent_memories_token_key(&self) -> &str {
        MOST_RECENT_MEMORIES_TOKEN_KEY
    }

    fn memory_keys(&self) -> Vec<String> {
        vec![
            RELEVANT_MEMORIES_KEY.to_string(),
            MOST_RECENT_MEMORIES_KEY.to_string(),
        ]
    }

    async fn load_memory_variables(&self, inputs: &ChainValues) -> Result<ChainValues, MemoryError> {
        let mut vars = ChainValues::new();

        if let Some(queries) = inputs.get(QUERIES_KEY) {
            let text = self.relevant_memories(&queries_from(queries)).await?;
            vars.insert(RELEVANT_MEMORIES_KEY, text);
        }

        if let Some(consumed) = inputs.get(MOST_RECENT_MEMORIES_TOKEN_KEY) {
            let consumed = consumed.as_u64().ok_or_else(|| {
                MemoryError::QueryFailed(format!(
                    "{MOST_RECENT_MEMORIES_TOKEN_KEY} must be a non-negative integer"
                ))
            })?;
            let text = self.most_recent_memories(consumed as usize).await?;
            vars.insert(MOST_RECENT_MEMORIES_KEY, text);
        }

        Ok(vars)
    }

    async fn save_context(&self, _inputs: &ChainValues, outputs: &ChainValues) -> Result<(), MemoryError> {
        match outputs.get_text(ADD_MEMORY_KEY) {
            Some(content) if !content.is_empty() => {
                self.add_memory(&content, None, serde_json::Map::new()).await
            }
            _ => Ok(()),
        }
    }
}
