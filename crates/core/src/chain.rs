//! Chain trait - a composable unit mapping input values to output values.
//!
//! Every orchestration step (an LLM call, the critique-revise loop, the
//! generative agent) is a `Chain`. Callers go through [`Chain::call`], which
//! checks the declared input keys before any external call is issued.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ChainError;

/// The input/output envelope passed between chain steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainValues(BTreeMap<String, Value>);

impl ChainValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Merge `other` into `self`; keys in `other` win.
    pub fn extend(&mut self, other: ChainValues) {
        self.0.extend(other.0);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read a value as text. Strings are returned as-is, other values
    /// are rendered the way a prompt template would render them.
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.0.get(key).map(value_to_text)
    }

    /// Like [`get_text`](Self::get_text) but a missing key is an error.
    pub fn require_text(&self, key: &str) -> Result<String, ChainError> {
        self.get_text(key).ok_or_else(|| ChainError::InvalidInput {
            key: key.to_string(),
            reason: "value is missing".into(),
        })
    }
}

impl FromIterator<(String, Value)> for ChainValues {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Render a JSON value as prompt text.
///
/// Strings lose their quotes, `null` becomes empty, arrays of strings are
/// newline-joined, and everything else is compact JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

/// Fail fast when any of `required` is absent from `inputs`.
pub fn validate_inputs(
    chain: &str,
    required: &[String],
    inputs: &ChainValues,
) -> Result<(), ChainError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|k| !inputs.contains_key(k))
        .cloned()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ChainError::MissingInputKeys {
            chain: chain.to_string(),
            keys: missing,
        })
    }
}

/// The core Chain trait.
#[async_trait]
pub trait Chain: Send + Sync {
    /// Identifier used in logs and errors (e.g., "llm_chain").
    fn chain_type(&self) -> &str;

    /// Keys that must be present in the inputs.
    fn input_keys(&self) -> Vec<String>;

    /// Keys this chain produces.
    fn output_keys(&self) -> Vec<String>;

    /// Run the chain on already-validated inputs.
    async fn execute(&self, inputs: ChainValues) -> Result<ChainValues, ChainError>;

    /// Validate inputs, then run the chain.
    async fn call(&self, inputs: ChainValues) -> Result<ChainValues, ChainError> {
        validate_inputs(self.chain_type(), &self.input_keys(), &inputs)?;
        self.execute(inputs).await
    }
}
