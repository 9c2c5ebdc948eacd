//! Shared test helpers for pattern tests.

use chainkit_core::error::ProviderError;
use chainkit_core::message::Message;
use chainkit_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// A mock provider that returns scripted replies in order and records
/// every prompt it was sent.
///
/// Panics if more calls are made than replies provided.
pub struct RecordingProvider {
    replies: Vec<String>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingProvider {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// The user prompt of every call so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for RecordingProvider {
    fn name(&self) -> &str {
        "recording_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut prompts = self.prompts.lock().unwrap();
        let index = prompts.len();
        let reply = self.replies.get(index).unwrap_or_else(|| {
            panic!(
                "RecordingProvider: no more replies (call #{}, have {})",
                index,
                self.replies.len()
            )
        });

        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        prompts.push(prompt);
        Ok(make_text_response(reply))
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}
