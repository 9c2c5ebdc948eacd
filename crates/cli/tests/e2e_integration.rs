//! End-to-end tests across the Chainkit crates.
//!
//! These wire real chains, parsers, tools and the embedding batcher to
//! scripted collaborators and check what comes out the other end.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chainkit_agent::{ConstitutionalChain, LlmChain, PrincipleRegistry};
use chainkit_core::chain::{Chain, ChainValues};
use chainkit_core::embeddings::Embeddings;
use chainkit_core::error::ProviderError;
use chainkit_core::message::{FunctionCall, Generation, Message};
use chainkit_core::prompt::PromptTemplate;
use chainkit_core::provider::{Provider, ProviderRequest, ProviderResponse};
use chainkit_core::tool::ToolCall;
use chainkit_parsers::{JsonKeyOutputFunctionsParser, OutputFunctionsParser, OutputParser, RegexParser};
use chainkit_providers::{BatchedEmbeddings, PredictionConnection, PredictionResponse};
use chainkit_tools::{JsonSpec, json_registry};
use serde_json::{Value, json};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted messages in sequence.
struct ScriptedProvider {
    responses: Mutex<Vec<Message>>,
    call_count: Mutex<usize>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Message>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
        })
    }

    fn text(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Message::assistant(*r)).collect())
    }

    fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        if *count >= responses.len() {
            panic!(
                "ScriptedProvider exhausted: call #{}, have {}",
                *count,
                responses.len()
            );
        }
        let message = responses[*count].clone();
        *count += 1;
        Ok(ProviderResponse {
            message,
            usage: None,
            model: request.model,
        })
    }
}

fn function_call_reply(name: &str, arguments: Value) -> Message {
    Message::assistant("").with_function_call(FunctionCall::new(name, arguments.to_string()))
}

// ── Mock prediction endpoint ─────────────────────────────────────────────

/// Returns a one-dimensional vector per instance: the content length.
struct LengthConnection;

#[async_trait]
impl PredictionConnection for LengthConnection {
    async fn request(
        &self,
        instances: Vec<Value>,
        _parameters: Value,
    ) -> Result<PredictionResponse, ProviderError> {
        let predictions = instances
            .iter()
            .map(|i| {
                let len = i["content"].as_str().unwrap_or_default().len();
                json!({"embeddings": {"values": [len as f32]}})
            })
            .collect();
        Ok(PredictionResponse {
            predictions: Some(predictions),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_function_call_drives_json_tool() {
    let provider = ScriptedProvider::new(vec![function_call_reply(
        "json_get_value",
        json!({"input": "/servers/0/host"}),
    )]);
    let response = provider
        .complete(ProviderRequest::prompt("mock", "Which host runs first?", 0.0))
        .await
        .unwrap();
    let generations = vec![Generation::from(response.message.clone())];

    let arguments: Value =
        serde_json::from_str(&OutputFunctionsParser::default().parse_result(&generations).unwrap()).unwrap();
    let call_name = response.message.function_call.and_then(|c| c.name).unwrap();

    let registry = json_registry(Arc::new(JsonSpec::new(json!({
        "servers": [{"host": "alpha.internal", "port": 8080}]
    }))));
    let result = registry
        .execute(&ToolCall {
            id: "call_1".into(),
            name: call_name,
            arguments,
        })
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.output, "alpha.internal");
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn e2e_keyed_parser_soft_fails_on_absent_key() {
    let generations = vec![Generation::from(function_call_reply(
        "extract",
        json!({"name": "Ada", "age": 36}),
    ))];

    assert_eq!(
        JsonKeyOutputFunctionsParser::new("age").parse_result(&generations).unwrap(),
        Some(json!(36))
    );
    assert_eq!(
        JsonKeyOutputFunctionsParser::new("email").parse_result(&generations).unwrap(),
        None
    );
}

#[tokio::test]
async fn e2e_revised_answer_parsed_by_regex() {
    let provider = ScriptedProvider::text(&[
        "Answer: 42",
        "No working is shown.\n\nRevision request: show it",
        "Answer: 42\nReason: six times seven",
    ]);
    let base = Arc::new(LlmChain::new(
        provider.clone(),
        "mock",
        PromptTemplate::from_template("What is {expr}?"),
    ));
    let principles = PrincipleRegistry::builtin().resolve(&["thoughtful"]).unwrap();
    let chain = ConstitutionalChain::from_llm(provider.clone(), "mock", base, principles);

    let out = chain.call(ChainValues::new().with("expr", "6 * 7")).await.unwrap();
    let revised = out.get_text("output").unwrap();

    let parser = RegexParser::new(
        r"Answer: (\d+)\nReason: (.*)",
        vec!["answer".into(), "reason".into()],
    )
    .unwrap();
    let fields = parser.parse(&revised).unwrap();
    assert_eq!(fields["answer"], "42");
    assert_eq!(fields["reason"], "six times seven");
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn e2e_batched_embeddings_preserve_order() {
    let embeddings = BatchedEmbeddings::new(Arc::new(LengthConnection));
    let texts: Vec<String> = (1..=12).map(|n| "x".repeat(n)).collect();

    let vectors = embeddings.embed_documents(&texts).await.unwrap();

    assert_eq!(vectors.len(), 12);
    for (i, v) in vectors.iter().enumerate() {
        assert_eq!(v, &vec![(i + 1) as f32]);
    }
    assert_eq!(embeddings.embed_query("abc").await.unwrap(), vec![3.0]);
}
