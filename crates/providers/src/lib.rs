//! Provider implementations for Chainkit.
//!
//! - [`OpenAiCompatProvider`] implements `chainkit_core::Provider` for any
//!   OpenAI-compatible chat endpoint.
//! - [`VertexAiConnection`] implements [`PredictionConnection`] for Vertex AI.
//! - [`BatchedEmbeddings`] implements `chainkit_core::Embeddings` on top of
//!   any prediction connection.

pub mod embeddings;
pub mod openai_compat;
pub mod vertex;

pub use embeddings::{BatchedEmbeddings, DEFAULT_CHUNK_SIZE};
pub use openai_compat::OpenAiCompatProvider;
pub use vertex::{PredictionConnection, PredictionResponse, VertexAiConnection, VertexAiSettings};

use chainkit_config::AppConfig;
use std::sync::Arc;

/// Build the chat provider described by the configuration.
pub fn provider_from_config(
    config: &AppConfig,
) -> Result<OpenAiCompatProvider, chainkit_core::error::ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        chainkit_core::error::ProviderError::NotConfigured(
            "no API key (set api_key or CHAINKIT_API_KEY)".into(),
        )
    })?;
    Ok(OpenAiCompatProvider::new("openai", &config.base_url, api_key))
}

/// Build the Vertex AI embedding batcher described by the configuration.
pub fn embeddings_from_config(
    config: &AppConfig,
) -> Result<BatchedEmbeddings, chainkit_core::error::ProviderError> {
    let section = &config.embeddings;
    let project_id = section.project_id.clone().ok_or_else(|| {
        chainkit_core::error::ProviderError::NotConfigured(
            "embeddings.project_id is not set".into(),
        )
    })?;
    let access_token = section.access_token.clone().ok_or_else(|| {
        chainkit_core::error::ProviderError::NotConfigured(
            "no Vertex AI access token (set GOOGLE_VERTEX_AI_ACCESS_TOKEN)".into(),
        )
    })?;

    let connection = VertexAiConnection::new(
        VertexAiSettings {
            endpoint: section.endpoint.clone(),
            location: section.location.clone(),
            project_id,
            model: section.model.clone(),
        },
        access_token,
    );
    Ok(BatchedEmbeddings::new(Arc::new(connection)).with_chunk_size(section.chunk_size))
}
