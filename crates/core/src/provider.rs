//! Provider trait - the abstraction over LLM backends.
//!
//! A Provider knows how to send a conversation to an LLM and get a
//! complete response back. Chains only ever talk to this trait.
//!
//! Implementations: OpenAI-compatible endpoints (see `chainkit-providers`),
//! scripted mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::Message;
use crate::token::estimate_tokens;

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available functions the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

fn default_temperature() -> f32 {
    0.7
}

impl ProviderRequest {
    /// A single-turn request carrying one user prompt.
    pub fn prompt(model: impl Into<String>, prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::user(prompt)],
            temperature,
            max_tokens: None,
            tools: Vec::new(),
            stop: Vec::new(),
        }
    }
}

/// A tool definition sent to the LLM so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. Chains call `complete()`
/// without knowing which backend answers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Count the tokens the model would see for `text`.
    ///
    /// Default implementation uses the 4-characters-per-token estimate.
    fn num_tokens(&self, text: &str) -> usize {
        estimate_tokens(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_request_has_one_user_message() {
        let req = ProviderRequest::prompt("gpt-4o-mini", "Tell me a joke", default_temperature());
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].content, "Tell me a joke");
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "json_get_value".into(),
            description: "Read a value at a JSON pointer".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "input": { "type": "string", "description": "The pointer" }
                },
                "required": ["input"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("json_get_value"));
        assert!(json.contains("input"));
    }
}
