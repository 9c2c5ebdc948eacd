//! Generic JSON-over-HTTP retriever.

use async_trait::async_trait;
use chainkit_core::document::{Document, Retriever};
use chainkit_core::error::RetrieverError;
use serde_json::Value;
use tracing::{debug, warn};

/// Backend-specific request and response shaping.
pub trait RemoteRetriever: Send + Sync {
    /// Endpoint the body is POSTed to.
    fn url(&self) -> &str;

    fn create_json_body(&self, query: &str) -> Value;

    fn process_json_response(&self, json: Value) -> Result<Vec<Document>, RetrieverError>;
}

/// Sends a [`RemoteRetriever`]'s body over HTTP and maps the reply.
pub struct RemoteRetrieverClient<R> {
    backend: R,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl<R: RemoteRetriever> RemoteRetrieverClient<R> {
    pub fn new(backend: R) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            backend,
            auth_token: None,
            client,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn backend(&self) -> &R {
        &self.backend
    }
}

#[async_trait]
impl<R: RemoteRetriever> Retriever for RemoteRetrieverClient<R> {
    async fn get_relevant_documents(&self, query: &str) -> Result<Vec<Document>, RetrieverError> {
        let url = self.backend.url();
        let body = self.backend.create_json_body(query);

        debug!(url = %url, "Sending retriever query");

        let mut request = self.client.post(url).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RetrieverError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Retriever endpoint returned error");
            return Err(RetrieverError::Status {
                status_code: status.as_u16(),
                message: error_body,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| RetrieverError::ResponseShape(format!("Body is not JSON: {e}")))?;

        let documents = self.backend.process_json_response(json)?;
        debug!(count = documents.len(), "Retriever returned documents");
        Ok(documents)
    }
}
