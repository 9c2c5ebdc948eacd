//! Documents and the retriever trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::RetrieverError;

/// A unit of retrieved content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,

    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Maps a query string to zero or more documents.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn get_relevant_documents(&self, query: &str) -> std::result::Result<Vec<Document>, RetrieverError>;
}
