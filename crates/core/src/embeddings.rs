//! Embeddings trait - text in, vectors out.

use async_trait::async_trait;
use crate::error::ProviderError;

/// Produces one embedding vector per input text, in input order.
#[async_trait]
pub trait Embeddings: Send + Sync {
    /// Embed a batch of documents. The result mirrors `documents` in length
    /// and order unless the backend returned malformed data.
    async fn embed_documents(&self, documents: &[String]) -> std::result::Result<Vec<Vec<f32>>, ProviderError>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        if vectors.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vectors.swap_remove(0))
    }
}
