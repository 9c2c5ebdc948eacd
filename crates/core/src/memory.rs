//! Memory traits - long-term storage and the chain-facing memory contract.
//!
//! Two layers:
//! - [`MemoryBackend`] stores and searches raw [`MemoryEntry`] records.
//! - [`AgentMemory`] is what chains see: it loads prompt variables
//!   (relevant memories, most recent memories) and records new observations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::chain::ChainValues;
use crate::error::MemoryError;

/// A single memory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Unique ID for this memory
    pub id: String,

    /// The content of the memory
    pub content: String,

    /// Tags for categorization
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Source of the memory (agent name, tool output, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Caller-supplied metadata
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// When this memory was created
    pub created_at: DateTime<Utc>,

    /// When this memory was last accessed
    pub last_accessed: DateTime<Utc>,

    /// Relevance score (set by search operations)
    #[serde(default)]
    pub score: f32,
}

impl MemoryEntry {
    /// A fresh entry with an empty id (the backend assigns one).
    pub fn new(content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            content: content.into(),
            tags: Vec::new(),
            source: None,
            metadata: serde_json::Map::new(),
            created_at,
            last_accessed: created_at,
            score: 0.0,
        }
    }
}

/// A query for searching memories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryQuery {
    /// The search text
    pub text: String,

    /// Maximum number of results
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Minimum relevance score threshold
    #[serde(default)]
    pub min_score: f32,

    /// Filter by tags
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_limit() -> usize {
    10
}

impl MemoryQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: default_limit(),
            min_score: 0.0,
            tags: Vec::new(),
        }
    }
}

/// The storage trait.
///
/// Implementations: in-memory (for testing and ephemeral agents).
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Store a new memory entry.
    async fn store(&self, entry: MemoryEntry) -> std::result::Result<String, MemoryError>;

    /// Search memories by query.
    async fn search(&self, query: MemoryQuery) -> std::result::Result<Vec<MemoryEntry>, MemoryError>;

    /// The `limit` most recently created memories, newest first.
    async fn recent(&self, limit: usize) -> std::result::Result<Vec<MemoryEntry>, MemoryError>;

    /// Get total memory count.
    async fn count(&self) -> std::result::Result<usize, MemoryError>;
}

/// The memory contract consumed by chains and the generative agent.
#[async_trait]
pub trait AgentMemory: Send + Sync {
    /// Record an observation.
    async fn add_memory(
        &self,
        content: &str,
        now: Option<DateTime<Utc>>,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> std::result::Result<(), MemoryError>;

    /// Prompt variable that receives memories relevant to the current queries.
    fn relevant_memories_key(&self) -> &str;

    /// Input variable carrying the number of prompt tokens already consumed.
    fn most_recent_memories_token_key(&self) -> &str;

    /// Every prompt variable this memory can supply.
    fn memory_keys(&self) -> Vec<String>;

    /// Compute memory-supplied prompt variables for the given chain inputs.
    async fn load_memory_variables(
        &self,
        inputs: &ChainValues,
    ) -> std::result::Result<ChainValues, MemoryError>;

    /// Persist whatever the chain run produced that is worth remembering.
    async fn save_context(
        &self,
        inputs: &ChainValues,
        outputs: &ChainValues,
    ) -> std::result::Result<(), MemoryError>;
}
