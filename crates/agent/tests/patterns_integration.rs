//! End-to-end pattern tests with a scripted provider and real memory.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chainkit_agent::{
    ConstitutionalChain, GenerativeAgent, GenerativeAgentConfig, LlmChain, PrincipleRegistry,
};
use chainkit_core::chain::{Chain, ChainValues};
use chainkit_core::error::{ChainError, ProviderError};
use chainkit_core::memory::{AgentMemory, MemoryBackend};
use chainkit_core::message::Message;
use chainkit_core::prompt::PromptTemplate;
use chainkit_core::provider::{Provider, ProviderRequest, ProviderResponse};
use chainkit_memory::{GenerativeAgentMemory, InMemoryBackend};
use chrono::{TimeZone, Utc};

struct ScriptedProvider {
    replies: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| ProviderError::Network("script exhausted".into()))?;
        Ok(ProviderResponse {
            message: Message::assistant(reply),
            usage: None,
            model: request.model,
        })
    }
}

#[tokio::test]
async fn critique_revise_with_registry_principles() {
    let provider = ScriptedProvider::new(&[
        "Steal the neighbour's wifi.",
        "The answer encourages illegal access.\n\nRevision request: make it legal",
        "Ask your neighbour to share their wifi.",
        "It is considerate enough.",
        "Politely ask your neighbour whether they would share their wifi.",
    ]);
    let principles = PrincipleRegistry::builtin()
        .resolve(&["illegal", "thoughtful"])
        .unwrap();
    let base = Arc::new(LlmChain::new(
        provider.clone(),
        "mock-model",
        PromptTemplate::from_template("How do I get free {thing}?"),
    ));
    let chain = ConstitutionalChain::from_llm(provider.clone(), "mock-model", base, principles);

    let out = chain
        .call(ChainValues::new().with("thing", "wifi"))
        .await
        .unwrap();

    assert_eq!(
        out.get_text("output").as_deref(),
        Some("Politely ask your neighbour whether they would share their wifi.")
    );
    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 5);
    assert!(prompts[2].contains("Critique: The answer encourages illegal access.\n\nRevision request:"));
    assert!(!prompts[2].contains("make it legal"));
}

#[tokio::test]
async fn unknown_principle_is_rejected() {
    let err = PrincipleRegistry::builtin().resolve(&["not-a-principle"]).unwrap_err();
    assert!(matches!(err, ChainError::UnknownPrinciple(_)));
}

#[tokio::test]
async fn provider_failure_propagates_unchanged() {
    let provider = ScriptedProvider::new(&["draft"]);
    let base = Arc::new(LlmChain::new(
        provider.clone(),
        "mock-model",
        PromptTemplate::from_template("{q}"),
    ));
    let principles = PrincipleRegistry::builtin().resolve(&["harmful"]).unwrap();
    let chain = ConstitutionalChain::from_llm(provider, "mock-model", base, principles);

    let err = chain.call(ChainValues::new().with("q", "hi")).await.unwrap_err();
    assert!(matches!(err, ChainError::Provider(ProviderError::Network(_))));
}

#[tokio::test]
async fn persona_conversation_builds_memory() {
    let provider = ScriptedProvider::new(&[
        // first reaction
        "Tommie is hopeful",
        "Bruno",
        "wagging his tail",
        "Bruno is Tommie's dog",
        "SAY: \"Good boy, Bruno!\"",
        // second reaction: summary still fresh
        "Bruno",
        "fetching a ball",
        "Tommie greeted Bruno earlier",
        "GOODBYE: \"Enough for today\"",
    ]);
    let memory = Arc::new(GenerativeAgentMemory::new(Arc::new(InMemoryBackend::new())));
    memory
        .add_memory("Tommie has a dog named Bruno", None, Default::default())
        .await
        .unwrap();
    let agent = GenerativeAgent::new(
        provider.clone(),
        "mock-model",
        memory.clone(),
        GenerativeAgentConfig::new("Tommie", "hopeful", "walking the dog"),
    );

    let t1 = Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap();
    let (cont, said) = agent
        .generate_dialogue_response("Bruno wags his tail", Some(t1))
        .await
        .unwrap();
    assert!(cont);
    assert_eq!(said, "Tommie said \"Good boy, Bruno!\"");

    let t2 = Utc.with_ymd_and_hms(2026, 10, 16, 8, 10, 0).unwrap();
    let (cont, said) = agent
        .generate_dialogue_response("Bruno brings a ball", Some(t2))
        .await
        .unwrap();
    assert!(!cont);
    assert_eq!(said, "Tommie said \"Enough for today\"");

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 9);
    // The relationship query found the stored fact about Bruno.
    assert!(prompts[3].contains("- Tommie has a dog named Bruno"));
    // The second reaction sees the first one among the recent memories.
    assert!(prompts[8].contains("Tommie observed Bruno wags his tail and said"));
    assert_eq!(memory.backend().count().await.unwrap(), 3);
}
