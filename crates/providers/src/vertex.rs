//! Vertex AI prediction connection.
//!
//! `PredictionConnection` is the seam the embedding batcher talks to: one
//! call carries a list of instances plus shared parameters and returns the
//! raw `predictions` array.

use async_trait::async_trait;
use chainkit_core::error::ProviderError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Body of a successful `:predict` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub predictions: Option<Vec<serde_json::Value>>,
}

/// A remote endpoint that accepts prediction instances.
#[async_trait]
pub trait PredictionConnection: Send + Sync {
    async fn request(
        &self,
        instances: Vec<serde_json::Value>,
        parameters: serde_json::Value,
    ) -> std::result::Result<PredictionResponse, ProviderError>;
}

/// Settings for a Vertex AI publisher model.
#[derive(Debug, Clone)]
pub struct VertexAiSettings {
    pub endpoint: String,
    pub location: String,
    pub project_id: String,
    pub model: String,
}

impl VertexAiSettings {
    pub fn url(&self) -> String {
        format!(
            "https://{}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            self.endpoint, self.project_id, self.location, self.model
        )
    }
}

/// Calls the Vertex AI `:predict` REST endpoint with a bearer access token.
pub struct VertexAiConnection {
    settings: VertexAiSettings,
    access_token: String,
    client: reqwest::Client,
}

impl VertexAiConnection {
    pub fn new(settings: VertexAiSettings, access_token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            settings,
            access_token: access_token.into(),
            client,
        }
    }

    pub fn settings(&self) -> &VertexAiSettings {
        &self.settings
    }
}

#[async_trait]
impl PredictionConnection for VertexAiConnection {
    async fn request(
        &self,
        instances: Vec<serde_json::Value>,
        parameters: serde_json::Value,
    ) -> std::result::Result<PredictionResponse, ProviderError> {
        let url = self.settings.url();
        let body = serde_json::json!({
            "instances": instances,
            "parameters": parameters,
        });

        debug!(
            model = %self.settings.model,
            count = instances.len(),
            "Sending prediction request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid or expired Vertex AI access token".into(),
            ));
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(self.settings.model.clone()));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Vertex AI returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        response.json().await.map_err(|e| ProviderError::ApiError {
            status_code: 200,
            message: format!("Failed to parse prediction response: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_url_layout() {
        let settings = VertexAiSettings {
            endpoint: "us-central1-aiplatform.googleapis.com".into(),
            location: "us-central1".into(),
            project_id: "demo".into(),
            model: "textembedding-gecko".into(),
        };
        assert_eq!(
            settings.url(),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/demo/locations/us-central1/publishers/google/models/textembedding-gecko:predict"
        );
    }

    #[test]
    fn missing_predictions_deserializes_to_none() {
        let parsed: PredictionResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.predictions.is_none());
    }
}
