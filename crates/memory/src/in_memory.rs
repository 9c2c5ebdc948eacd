//! In-memory backend for tests and ephemeral personas.

use async_trait::async_trait;
use chainkit_core::error::MemoryError;
use chainkit_core::memory::{MemoryBackend, MemoryEntry, MemoryQuery};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

const STOPWORDS: &[&str] = &[
    "the", "and", "what", "is", "are", "was", "between", "with", "for", "that", "this", "his",
    "her", "its", "from", "into", "about",
];

/// Lowercased alphanumeric terms worth matching on.
fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| t.len() > 2 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Stores memories in a Vec and ranks them by term overlap with the query.
pub struct InMemoryBackend {
    entries: Arc<RwLock<Vec<MemoryEntry>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn store(&self, mut entry: MemoryEntry) -> Result<String, MemoryError> {
        if entry.id.is_empty() {
            entry.id = Uuid::new_v4().to_string();
        }
        let id = entry.id.clone();
        self.entries.write().await.push(entry);
        Ok(id)
    }

    async fn search(&self, query: MemoryQuery) -> Result<Vec<MemoryEntry>, MemoryError> {
        let query_terms = terms(&query.text);
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut entries = self.entries.write().await;
        let now = Utc::now();

        let mut results: Vec<MemoryEntry> = entries
            .iter_mut()
            .filter(|e| query.tags.is_empty() || query.tags.iter().any(|t| e.tags.contains(t)))
            .filter_map(|e| {
                let hits = terms(&e.content).intersection(&query_terms).count();
                if hits == 0 {
                    return None;
                }
                e.last_accessed = now;
                let mut hit = e.clone();
                hit.score = hits as f32 / query_terms.len() as f32;
                Some(hit)
            })
            .filter(|e| e.score >= query.min_score)
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.created_at.cmp(&a.created_at))
        });
        results.truncate(query.limit);

        Ok(results)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<MemoryEntry>, MemoryError> {
        let entries = self.entries.read().await;
        let mut sorted: Vec<MemoryEntry> = entries.iter().cloned().collect();
        // Ties keep insertion order, so the reversal puts later inserts first.
        sorted.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        sorted.reverse();
        sorted.truncate(limit);
        Ok(sorted)
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.entries.read().await.len())
    }
}
