//! Generative agent - a persona that reacts to observations using memory.
//!
//! Every reaction goes through the same sequence of model calls:
//!
//! 1. Refresh the self-summary if it is stale
//! 2. Ask which entity the observation is about
//! 3. Ask what that entity is doing
//! 4. Summarize memories about the relationship and the action
//! 5. Ask for the reaction itself, with the recent-memory token budget
//!
//! The reply is scanned for `REACT:`, `SAY:` or `GOODBYE:`. Matches are
//! written back to memory and turned into the chain output.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chainkit_config::AgentSection;
use chainkit_core::chain::{Chain, ChainValues};
use chainkit_core::error::ChainError;
use chainkit_core::memory::AgentMemory;
use chainkit_core::prompt::PromptTemplate;
use chainkit_core::provider::Provider;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};

use crate::llm_chain::{LlmChain, output_text};

const ENTITY_PROMPT: &str =
    "What is the observed entity in the following observation? {observation}\nEntity=";

const ENTITY_ACTION_PROMPT: &str =
    "What is the {entity} doing in the following observation? {observation}\nThe {entity} is";

const RELATIONSHIP_PROMPT: &str = "
{q1}?
Context from memory:
{relevant_memories}
Relevant context:";

const SUMMARY_PROMPT: &str = "How would you summarize {name}'s core characteristics given the following statements:
----------
{relevant_memories}
----------
Do not embellish.

Summary: ";

const REACTION_PROMPT: &str = "{agent_summary_description}
It is {current_time}.
{agent_name}'s status: {agent_status}
Summary of relevant context from {agent_name}'s memory:
{relevant_memories}
Most recent observations: {most_recent_memories}
Observation: {observation}

";

/// Call to action used by [`GenerativeAgent::generate_reaction`].
pub const REACTION_SUFFIX: &str = "Should {agent_name} react to the observation, and if so, what would be an appropriate reaction? Respond in one line. If the action is to engage in dialogue, write:\nSAY: \"what to say\" \notherwise, write:\nREACT: {agent_name}'s reaction (if anything). \nEither do nothing, react, or say something but not both.\n\n";

/// Format a timestamp the way prompts show it, e.g. `October 16, 2026, 3:05 PM`.
pub fn format_time(now: DateTime<Utc>) -> String {
    now.format("%B %-d, %Y, %-I:%M %p").to_string()
}

/// Whether the cached summary must be regenerated.
pub fn should_refresh(
    now: DateTime<Utc>,
    last_refreshed: DateTime<Utc>,
    ttl_seconds: u64,
    force: bool,
    summary_is_empty: bool,
) -> bool {
    let elapsed = (now - last_refreshed).num_seconds();
    summary_is_empty || force || elapsed >= i64::try_from(ttl_seconds).unwrap_or(i64::MAX)
}

/// Strip a leading `"{name} "` and surrounding whitespace.
pub fn clean_response(name: &str, text: &str) -> String {
    let prefix = format!("{name} ");
    text.strip_prefix(prefix.as_str()).unwrap_or(text).trim().to_string()
}

/// What the model decided to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    React(String),
    Say(String),
    Goodbye(String),
    /// No marker found; carries the raw text.
    Unmatched(String),
}

impl Reply {
    /// Markers are checked in the order REACT, SAY, GOODBYE. The text after
    /// the last occurrence of the winning marker is kept.
    pub fn parse(name: &str, raw: &str) -> Self {
        let after = |marker: &str| raw.rsplit(marker).next().map(|t| clean_response(name, t)).unwrap_or_default();
        if raw.contains("REACT:") {
            Reply::React(after("REACT:"))
        } else if raw.contains("SAY:") {
            Reply::Say(after("SAY:"))
        } else if raw.contains("GOODBYE:") {
            Reply::Goodbye(after("GOODBYE:"))
        } else {
            Reply::Unmatched(raw.to_string())
        }
    }

    /// Only `SAY` keeps a dialogue going.
    pub fn continue_dialogue(&self) -> bool {
        matches!(self, Reply::Say(_))
    }
}

/// Identity and refresh settings of a persona.
#[derive(Debug, Clone)]
pub struct GenerativeAgentConfig {
    pub name: String,
    pub age: Option<u32>,
    pub traits: String,
    pub status: String,
    pub summary_refresh_seconds: u64,
}

impl GenerativeAgentConfig {
    pub fn new(name: impl Into<String>, traits: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: None,
            traits: traits.into(),
            status: status.into(),
            summary_refresh_seconds: AgentSection::default().summary_refresh_seconds,
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_settings(mut self, section: &AgentSection) -> Self {
        self.summary_refresh_seconds = section.summary_refresh_seconds;
        self
    }
}

/// The cached self-summary.
#[derive(Debug, Clone)]
pub struct SummaryState {
    pub summary: String,
    pub last_refreshed: DateTime<Utc>,
}

pub struct GenerativeAgent {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    memory: Arc<dyn AgentMemory>,
    config: GenerativeAgentConfig,
    state: Mutex<SummaryState>,
}

impl GenerativeAgent {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        memory: Arc<dyn AgentMemory>,
        config: GenerativeAgentConfig,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            memory,
            config,
            state: Mutex::new(SummaryState {
                summary: String::new(),
                last_refreshed: Utc::now(),
            }),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn config(&self) -> &GenerativeAgentConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn summary_state(&self) -> SummaryState {
        self.state().clone()
    }

    fn state(&self) -> MutexGuard<'_, SummaryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn chain(&self, template: &str) -> LlmChain {
        LlmChain::new(self.provider.clone(), self.model.clone(), PromptTemplate::from_template(template))
            .with_temperature(self.temperature)
            .with_output_key("output")
            .with_memory(self.memory.clone())
    }

    async fn run(&self, template: &str, inputs: ChainValues) -> Result<String, ChainError> {
        let chain = self.chain(template);
        let outputs = chain.call(inputs).await?;
        output_text(&chain, &outputs)
    }

    /// Record an observation in long-term memory.
    pub async fn add_memory(
        &self,
        content: &str,
        now: Option<DateTime<Utc>>,
        metadata: serde_json::Map<String, Value>,
    ) -> Result<(), ChainError> {
        self.memory.add_memory(content, now, metadata).await?;
        Ok(())
    }

    async fn entity_from_observation(&self, observation: &str) -> Result<String, ChainError> {
        self.run(ENTITY_PROMPT, ChainValues::new().with("observation", observation))
            .await
    }

    async fn entity_action(&self, observation: &str, entity: &str) -> Result<String, ChainError> {
        let action = self
            .run(
                ENTITY_ACTION_PROMPT,
                ChainValues::new()
                    .with("entity", entity)
                    .with("observation", observation),
            )
            .await?;
        Ok(action.trim().to_string())
    }

    /// Summarize memories about the observed entity and what it is doing.
    pub async fn summarize_related_memories(&self, observation: &str) -> Result<String, ChainError> {
        let entity = self.entity_from_observation(observation).await?;
        let action = self.entity_action(observation, &entity).await?;
        debug!(entity = %entity, action = %action, "Extracted observed entity");

        let q1 = format!("What is the relationship between {} and {}", self.config.name, entity);
        let q2 = format!("{entity} is {action}");
        let summary = self
            .run(
                RELATIONSHIP_PROMPT,
                ChainValues::new()
                    .with("q1", q1.clone())
                    .with("queries", serde_json::json!([q1, q2])),
            )
            .await?;
        Ok(summary.trim().to_string())
    }

    async fn compute_agent_summary(&self) -> Result<String, ChainError> {
        let name = &self.config.name;
        let summary = self
            .run(
                SUMMARY_PROMPT,
                ChainValues::new()
                    .with("name", name.clone())
                    .with("queries", serde_json::json!([format!("{name}'s core characteristics")])),
            )
            .await?;
        Ok(summary.trim().to_string())
    }

    /// The persona's self-description, regenerated when stale.
    ///
    /// The lock is never held across the model call, so two overlapping
    /// calls in a stale window may both regenerate.
    pub async fn get_summary(&self, now: DateTime<Utc>, force_refresh: bool) -> Result<String, ChainError> {
        let stale = {
            let state = self.state();
            should_refresh(
                now,
                state.last_refreshed,
                self.config.summary_refresh_seconds,
                force_refresh,
                state.summary.is_empty(),
            )
        };

        if stale {
            info!(agent = %self.config.name, "Refreshing agent summary");
            let summary = self.compute_agent_summary().await?;
            let mut state = self.state();
            state.summary = summary;
            state.last_refreshed = now;
        }

        let age = self
            .config
            .age
            .map(|a| a.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let summary = self.state().summary.clone();
        Ok(format!(
            "Name: {} (age: {})\nInnate traits: {}\n{}",
            self.config.name, age, self.config.traits, summary
        ))
    }

    /// Summary plus the current time and status.
    pub async fn get_full_header(&self, now: DateTime<Utc>, force_refresh: bool) -> Result<String, ChainError> {
        let summary = self.get_summary(now, force_refresh).await?;
        Ok(format!(
            "{}\nIt is {}.\n{}'s status: {}",
            summary,
            format_time(now),
            self.config.name,
            self.config.status
        ))
    }

    async fn react(
        &self,
        observation: &str,
        suffix: &str,
        now: Option<DateTime<Utc>>,
    ) -> Result<Reply, ChainError> {
        let current = now.unwrap_or_else(Utc::now);
        let prompt = PromptTemplate::from_template(format!("{REACTION_PROMPT}{suffix}"));

        let agent_summary_description = self.get_summary(current, false).await?;
        let relevant_memories = self.summarize_related_memories(observation).await?;

        let mut inputs = ChainValues::new()
            .with("agent_summary_description", agent_summary_description)
            .with("current_time", format_time(current))
            .with("agent_name", self.config.name.clone())
            .with("observation", observation)
            .with("agent_status", self.config.status.clone())
            .with("most_recent_memories", "");
        inputs.insert(self.memory.relevant_memories_key(), relevant_memories);

        let consumed = self.provider.num_tokens(&prompt.format(&inputs)?);
        inputs.insert(self.memory.most_recent_memories_token_key(), consumed);

        let raw = self.run(prompt.template(), inputs).await?;
        let reply = Reply::parse(&self.config.name, &raw);
        debug!(agent = %self.config.name, reply = ?reply, "Parsed reaction");

        let name = &self.config.name;
        match &reply {
            Reply::React(reaction) => {
                self.add_memory(
                    &format!("{name} observed {observation} and reacted by {reaction}"),
                    now,
                    Default::default(),
                )
                .await?;
            }
            Reply::Say(said) | Reply::Goodbye(said) => {
                self.add_memory(
                    &format!("{name} observed {observation} and said {said}"),
                    now,
                    Default::default(),
                )
                .await?;
            }
            Reply::Unmatched(_) => {}
        }

        Ok(reply)
    }

    fn output_of(&self, reply: &Reply) -> String {
        match reply {
            Reply::React(reaction) => reaction.clone(),
            Reply::Say(said) | Reply::Goodbye(said) => format!("{} said {}", self.config.name, said),
            Reply::Unmatched(raw) => raw.clone(),
        }
    }

    async fn call_with_suffix(
        &self,
        observation: &str,
        suffix: String,
        now: Option<DateTime<Utc>>,
    ) -> Result<(bool, String), ChainError> {
        let now_value = now.map(|t| Value::String(t.to_rfc3339())).unwrap_or(Value::Null);
        let outputs = self
            .call(
                ChainValues::new()
                    .with("observation", observation)
                    .with("suffix", suffix)
                    .with("now", now_value),
            )
            .await?;
        let continue_dialogue = outputs
            .get("continue_dialogue")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let output = outputs.get_text("output").unwrap_or_default();
        Ok((continue_dialogue, output))
    }

    /// React to an observation; returns `(continue_dialogue, output)`.
    pub async fn generate_reaction(
        &self,
        observation: &str,
        now: Option<DateTime<Utc>>,
    ) -> Result<(bool, String), ChainError> {
        self.call_with_suffix(observation, REACTION_SUFFIX.to_string(), now).await
    }

    /// Answer in a conversation; returns `(continue_dialogue, output)`.
    pub async fn generate_dialogue_response(
        &self,
        observation: &str,
        now: Option<DateTime<Utc>>,
    ) -> Result<(bool, String), ChainError> {
        let suffix = format!(
            "What would {} say? To end the conversation, write: GOODBYE: \"what to say\". Otherwise to continue the conversation, write: SAY: \"what to say next\"\n\n",
            self.config.name
        );
        self.call_with_suffix(observation, suffix, now).await
    }
}

fn parse_now(value: Option<&Value>) -> Result<Option<DateTime<Utc>>, ChainError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| ChainError::InvalidInput {
                key: "now".into(),
                reason: e.to_string(),
            }),
        Some(other) => Err(ChainError::InvalidInput {
            key: "now".into(),
            reason: format!("expected an RFC 3339 timestamp or null, got {other}"),
        }),
    }
}

#[async_trait]
impl Chain for GenerativeAgent {
    fn chain_type(&self) -> &str {
        "generative_agent_executor"
    }

    fn input_keys(&self) -> Vec<String> {
        vec!["observation".into(), "suffix".into(), "now".into()]
    }

    fn output_keys(&self) -> Vec<String> {
        vec!["output".into(), "continue_dialogue".into()]
    }

    async fn execute(&self, inputs: ChainValues) -> Result<ChainValues, ChainError> {
        let observation = inputs.require_text("observation")?;
        let suffix = inputs.require_text("suffix")?;
        let now = parse_now(inputs.get("now"))?;

        let reply = self.react(&observation, &suffix, now).await?;
        Ok(ChainValues::new()
            .with("output", self.output_of(&reply))
            .with("continue_dialogue", reply.continue_dialogue()))
    }
}
