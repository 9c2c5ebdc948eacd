//! Critique-revise loop.
//!
//! Runs a base chain once, then for each principle in order asks a critique
//! chain what is wrong with the current response and a revision chain to fix
//! it. The revision becomes the input to the next principle.
//!
//! # Flow
//!
//! 1. Call the base chain, keep its output and the rendered prompt
//! 2. For each principle: critique, clean the critique, revise
//! 3. Return `{ output: <last revision> }`
//!
//! Failures from any call propagate as-is.

use std::sync::Arc;

use async_trait::async_trait;
use chainkit_core::chain::{Chain, ChainValues};
use chainkit_core::error::ChainError;
use chainkit_core::prompt::PromptTemplate;
use chainkit_core::provider::Provider;
use tracing::{debug, info};

use super::principles::ConstitutionalPrinciple;
use crate::llm_chain::{LlmChain, output_text};

pub const CRITIQUE_PROMPT: &str = "Human: {input_prompt}

Model: {output_from_model}

Critique request: {critique_request}

Critique:";

pub const REVISION_PROMPT: &str = "Human: {input_prompt}

Model: {output_from_model}

Critique request: {critique_request}

Critique: {critique}

Revision request: {revision_request}

Revision:";

/// Drop anything the critique model wrote past its critique.
///
/// Only applies when the text mentions "Revision request": the text is cut
/// at "Revision request:" and then at the first blank line.
pub fn parse_critique(raw: &str) -> String {
    if !raw.contains("Revision request") {
        return raw.to_string();
    }
    let head = raw.split("Revision request:").next().unwrap_or_default();
    head.split("\n\n").next().unwrap_or_default().to_string()
}

pub struct ConstitutionalChain {
    chain: Arc<LlmChain>,
    critique_chain: Arc<dyn Chain>,
    revision_chain: Arc<dyn Chain>,
    principles: Vec<ConstitutionalPrinciple>,
}

impl ConstitutionalChain {
    pub fn new(
        chain: Arc<LlmChain>,
        critique_chain: Arc<dyn Chain>,
        revision_chain: Arc<dyn Chain>,
        principles: Vec<ConstitutionalPrinciple>,
    ) -> Self {
        Self {
            chain,
            critique_chain,
            revision_chain,
            principles,
        }
    }

    /// Build the critique and revision chains from the default prompts.
    pub fn from_llm(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        chain: Arc<LlmChain>,
        principles: Vec<ConstitutionalPrinciple>,
    ) -> Self {
        let model = model.into();
        let critique = LlmChain::new(
            provider.clone(),
            model.clone(),
            PromptTemplate::from_template(CRITIQUE_PROMPT),
        );
        let revision = LlmChain::new(provider, model, PromptTemplate::from_template(REVISION_PROMPT));
        Self::new(chain, Arc::new(critique), Arc::new(revision), principles)
    }

    pub fn with_critique_chain(mut self, chain: Arc<dyn Chain>) -> Self {
        self.critique_chain = chain;
        self
    }

    pub fn with_revision_chain(mut self, chain: Arc<dyn Chain>) -> Self {
        self.revision_chain = chain;
        self
    }

    pub fn principles(&self) -> &[ConstitutionalPrinciple] {
        &self.principles
    }
}

#[async_trait]
impl Chain for ConstitutionalChain {
    fn chain_type(&self) -> &str {
        "constitutional_chain"
    }

    fn input_keys(&self) -> Vec<String> {
        self.chain.input_keys()
    }

    fn output_keys(&self) -> Vec<String> {
        vec!["output".into()]
    }

    async fn execute(&self, inputs: ChainValues) -> Result<ChainValues, ChainError> {
        info!(principles = self.principles.len(), "Starting critique-revise loop");

        let initial = self.chain.call(inputs.clone()).await?;
        let mut response = output_text(self.chain.as_ref(), &initial)?;
        let input_prompt = self.chain.prompt().format(&inputs)?;

        for principle in &self.principles {
            debug!(principle = %principle.name, "Requesting critique");
            let raw = self
                .critique_chain
                .call(
                    ChainValues::new()
                        .with("input_prompt", input_prompt.clone())
                        .with("output_from_model", response.clone())
                        .with("critique_request", principle.critique_request.clone()),
                )
                .await?;
            let critique = parse_critique(&output_text(self.critique_chain.as_ref(), &raw)?);

            debug!(principle = %principle.name, "Requesting revision");
            let revised = self
                .revision_chain
                .call(
                    ChainValues::new()
                        .with("input_prompt", input_prompt.clone())
                        .with("output_from_model", response.clone())
                        .with("critique_request", principle.critique_request.clone())
                        .with("critique", critique)
                        .with("revision_request", principle.revision_request.clone()),
                )
                .await?;
            response = output_text(self.revision_chain.as_ref(), &revised)?;
        }

        info!(chars = response.len(), "Critique-revise loop finished");
        Ok(ChainValues::new().with("output", response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_helpers::RecordingProvider;

    fn base_chain(provider: Arc<RecordingProvider>) -> Arc<LlmChain> {
        Arc::new(LlmChain::new(
            provider,
            "mock-model",
            PromptTemplate::from_template("Q: {question}"),
        ))
    }

    fn principles(n: usize) -> Vec<ConstitutionalPrinciple> {
        (0..n)
            .map(|i| ConstitutionalPrinciple::new(format!("p{i}"), format!("critique {i}"), format!("revise {i}")))
            .collect()
    }

    #[test]
    fn critique_cut_at_revision_marker_then_blank_line() {
        assert_eq!(parse_critique("bad\n\nRevision request: foo"), "bad");
        assert_eq!(parse_critique("too long\nRevision request: shorten"), "too long\n");
        assert_eq!(
            parse_critique("first\n\nsecond\nRevision request: x"),
            "first"
        );
    }

    #[test]
    fn critique_without_marker_unchanged() {
        assert_eq!(parse_critique("fine as is"), "fine as is");
        assert_eq!(parse_critique("keep\n\nboth paragraphs"), "keep\n\nboth paragraphs");
    }

    #[tokio::test]
    async fn runs_k_critiques_and_k_revisions_in_order() {
        let provider = Arc::new(RecordingProvider::new(&[
            "draft",
            "crit A",
            "rev A",
            "crit B\n\nRevision request: leaked",
            "rev B",
        ]));
        let chain = ConstitutionalChain::from_llm(
            provider.clone(),
            "mock-model",
            base_chain(provider.clone()),
            principles(2),
        );

        let out = chain
            .call(ChainValues::new().with("question", "why?"))
            .await
            .unwrap();

        assert_eq!(out.get_text("output").as_deref(), Some("rev B"));
        assert_eq!(provider.call_count(), 5);

        let prompts = provider.prompts();
        assert_eq!(prompts[0], "Q: why?");
        // First critique sees the draft.
        assert!(prompts[1].contains("Model: draft"));
        assert!(prompts[1].contains("Critique request: critique 0"));
        assert!(prompts[1].starts_with("Human: Q: why?"));
        // First revision sees the critique and the revision request.
        assert!(prompts[2].contains("Critique: crit A"));
        assert!(prompts[2].contains("Revision request: revise 0"));
        // Second principle works on the first revision.
        assert!(prompts[3].contains("Model: rev A"));
        // Leaked revision text is stripped from the critique.
        assert!(prompts[4].contains("Critique: crit B\n\nRevision request: revise 1"));
        assert!(!prompts[4].contains("leaked"));
    }

    #[tokio::test]
    async fn no_principles_returns_initial_output() {
        let provider = Arc::new(RecordingProvider::new(&["only answer"]));
        let chain = ConstitutionalChain::from_llm(
            provider.clone(),
            "mock-model",
            base_chain(provider.clone()),
            Vec::new(),
        );

        let out = chain
            .call(ChainValues::new().with("question", "?"))
            .await
            .unwrap();

        assert_eq!(out.get_text("output").as_deref(), Some("only answer"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn missing_input_fails_before_any_call() {
        let provider = Arc::new(RecordingProvider::new(&[]));
        let chain = ConstitutionalChain::from_llm(
            provider.clone(),
            "mock-model",
            base_chain(provider.clone()),
            principles(1),
        );

        assert_eq!(chain.input_keys(), vec!["question"]);
        let err = chain.call(ChainValues::new()).await.unwrap_err();
        assert!(matches!(err, ChainError::MissingInputKeys { .. }));
        assert_eq!(provider.call_count(), 0);
    }
}
