//! The basic chain: format a prompt, call the provider, return the text.

use std::sync::Arc;

use async_trait::async_trait;
use chainkit_core::chain::{Chain, ChainValues};
use chainkit_core::error::ChainError;
use chainkit_core::memory::AgentMemory;
use chainkit_core::prompt::PromptTemplate;
use chainkit_core::provider::{Provider, ProviderRequest};
use tracing::debug;

/// Output key used when none is configured.
pub const DEFAULT_OUTPUT_KEY: &str = "text";

/// A prompt bound to a provider, optionally backed by memory.
///
/// With memory attached, the variables the memory supplies are not required
/// from the caller: they are loaded before formatting and override caller
/// values of the same name. After the call the memory sees both inputs and
/// outputs through `save_context`.
pub struct LlmChain {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    prompt: PromptTemplate,
    output_key: String,
    memory: Option<Arc<dyn AgentMemory>>,
}

impl LlmChain {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, prompt: PromptTemplate) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            prompt,
            output_key: DEFAULT_OUTPUT_KEY.to_string(),
            memory: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = key.into();
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn AgentMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }
}

#[async_trait]
impl Chain for LlmChain {
    fn chain_type(&self) -> &str {
        "llm_chain"
    }

    fn input_keys(&self) -> Vec<String> {
        let memory_keys = self
            .memory
            .as_ref()
            .map(|m| m.memory_keys())
            .unwrap_or_default();
        self.prompt
            .input_variables()
            .iter()
            .filter(|v| !memory_keys.contains(v))
            .cloned()
            .collect()
    }

    fn output_keys(&self) -> Vec<String> {
        vec![self.output_key.clone()]
    }

    async fn execute(&self, inputs: ChainValues) -> Result<ChainValues, ChainError> {
        let mut values = inputs.clone();
        if let Some(memory) = &self.memory {
            values.extend(memory.load_memory_variables(&inputs).await?);
        }

        let prompt = self.prompt.format(&values)?;
        debug!(
            provider = %self.provider.name(),
            model = %self.model,
            prompt_chars = prompt.len(),
            "Calling provider"
        );

        let response = self
            .provider
            .complete(ProviderRequest::prompt(&self.model, prompt, self.temperature))
            .await?;

        let outputs = ChainValues::new().with(self.output_key.clone(), response.message.content);

        if let Some(memory) = &self.memory {
            memory.save_context(&inputs, &outputs).await?;
        }

        Ok(outputs)
    }
}

/// Read a chain's designated (first) output as text.
pub fn output_text(chain: &dyn Chain, outputs: &ChainValues) -> Result<String, ChainError> {
    let key = chain.output_keys().into_iter().next().unwrap_or_default();
    outputs
        .get_text(&key)
        .ok_or_else(|| ChainError::MissingOutput {
            chain: chain.chain_type().to_string(),
            key,
        })
}
