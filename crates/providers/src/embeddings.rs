//! Batched embeddings over a prediction connection.
//!
//! Inputs are split into consecutive chunks of at most `chunk_size`, one
//! request per chunk is issued concurrently, and the per-chunk vectors are
//! concatenated in chunk order. Completion order never affects output order.

use std::sync::Arc;

use async_trait::async_trait;
use chainkit_core::Embeddings;
use chainkit_core::error::ProviderError;
use futures::future::try_join_all;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::vertex::{PredictionConnection, PredictionResponse};

/// Vertex AI's per-request instance limit for text embedding models.
pub const DEFAULT_CHUNK_SIZE: usize = 5;

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingPrediction {
    embeddings: EmbeddingResult,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResult {
    values: Vec<f32>,
    #[allow(dead_code)]
    #[serde(default)]
    statistics: Option<EmbeddingStatistics>,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
struct EmbeddingStatistics {
    token_count: u32,
    truncated: bool,
}

/// Embeddings backed by any [`PredictionConnection`].
pub struct BatchedEmbeddings {
    connection: Arc<dyn PredictionConnection>,
    chunk_size: usize,
}

impl BatchedEmbeddings {
    pub fn new(connection: Arc<dyn PredictionConnection>) -> Self {
        Self {
            connection,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the chunk size. Values below 1 are clamped to 1.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    async fn embed_chunk(
        &self,
        index: usize,
        chunk: &[String],
    ) -> std::result::Result<Vec<Vec<f32>>, ProviderError> {
        let instances = chunk
            .iter()
            .map(|content| serde_json::json!({ "content": content }))
            .collect();

        let response = self
            .connection
            .request(instances, serde_json::json!({}))
            .await?;

        Ok(vectors_from_response(index, response))
    }
}

/// Pull `predictions[].embeddings.values` out of a chunk response.
///
/// A missing or malformed payload contributes nothing.
fn vectors_from_response(chunk: usize, response: PredictionResponse) -> Vec<Vec<f32>> {
    let Some(predictions) = response.predictions else {
        warn!(chunk, "Prediction response has no predictions, skipping chunk");
        return Vec::new();
    };

    let parsed: Result<Vec<EmbeddingPrediction>, _> = predictions
        .into_iter()
        .map(serde_json::from_value)
        .collect();

    match parsed {
        Ok(predictions) => predictions.into_iter().map(|p| p.embeddings.values).collect(),
        Err(e) => {
            warn!(chunk, error = %e, "Malformed embedding prediction, skipping chunk");
            Vec::new()
        }
    }
}

#[async_trait]
impl Embeddings for BatchedEmbeddings {
    async fn embed_documents(
        &self,
        documents: &[String],
    ) -> std::result::Result<Vec<Vec<f32>>, ProviderError> {
        let chunks: Vec<&[String]> = documents.chunks(self.chunk_size).collect();
        debug!(
            documents = documents.len(),
            chunks = chunks.len(),
            "Embedding documents"
        );

        let results = try_join_all(
            chunks
                .iter()
                .enumerate()
                .map(|(i, chunk)| self.embed_chunk(i, chunk)),
        )
        .await?;

        Ok(results.into_iter().flatten().collect())
    }
}
