//! JSON pointer inspection tools.
//!
//! [`JsonSpec`] wraps a parsed document and answers two questions about a
//! JSON pointer (`""`, `/key1/0/key2`): which keys live there, and what the
//! value is. Long values are cut at `max_value_length` characters; long
//! objects are not returned at all, the caller is told to list keys instead.

use std::sync::Arc;

use async_trait::async_trait;
use chainkit_config::JsonToolsConfig;
use chainkit_core::error::ToolError;
use chainkit_core::tool::{Tool, ToolResult};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_MAX_VALUE_LENGTH: usize = 4000;

const LARGE_DICTIONARY: &str = "Value is a large dictionary, should explore its keys directly.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum JsonSpecError {
    #[error("Invalid JSON pointer: {0}")]
    InvalidPointer(String),

    #[error("Value at {0} is not a dictionary, get the value directly instead.")]
    NotADictionary(String),

    #[error("Value at {0} is null or undefined.")]
    NullOrUndefined(String),
}

/// A JSON document explored through pointers.
#[derive(Debug, Clone)]
pub struct JsonSpec {
    obj: Arc<Value>,
    max_value_length: usize,
}

impl JsonSpec {
    pub fn new(obj: Value) -> Self {
        Self {
            obj: Arc::new(obj),
            max_value_length: DEFAULT_MAX_VALUE_LENGTH,
        }
    }

    pub fn with_max_value_length(mut self, max: usize) -> Self {
        self.max_value_length = max;
        self
    }

    pub fn with_settings(self, config: &JsonToolsConfig) -> Self {
        self.with_max_value_length(config.max_value_length)
    }

    pub fn max_value_length(&self) -> usize {
        self.max_value_length
    }

    fn resolve(&self, pointer: &str) -> Result<Option<&Value>, JsonSpecError> {
        if !pointer.is_empty() && !pointer.starts_with('/') {
            return Err(JsonSpecError::InvalidPointer(pointer.to_string()));
        }
        Ok(self.obj.pointer(pointer))
    }

    /// Comma-separated keys of the object at `pointer` in document order,
    /// pointer-escaped.
    pub fn get_keys(&self, pointer: &str) -> Result<String, JsonSpecError> {
        match self.resolve(pointer)? {
            Some(Value::Object(map)) => Ok(map
                .keys()
                .map(|k| k.replace('~', "~0").replace('/', "~1"))
                .collect::<Vec<_>>()
                .join(", ")),
            _ => Err(JsonSpecError::NotADictionary(pointer.to_string())),
        }
    }

    /// The value at `pointer` as text.
    ///
    /// Strings come back raw, everything else as compact JSON.
    pub fn get_value(&self, pointer: &str) -> Result<String, JsonSpecError> {
        let value = match self.resolve(pointer)? {
            None | Some(Value::Null) => {
                return Err(JsonSpecError::NullOrUndefined(pointer.to_string()));
            }
            Some(value) => value,
        };

        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        let length = text.chars().count();
        if length <= self.max_value_length {
            return Ok(text);
        }
        if value.is_object() {
            return Ok(LARGE_DICTIONARY.to_string());
        }
        let mut truncated: String = text.chars().take(self.max_value_length).collect();
        truncated.push_str("...");
        Ok(truncated)
    }
}

fn pointer_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "input": {
                "type": "string",
                "description": "JSON pointer to inspect, e.g. /key1/0/key2"
            }
        },
        "required": ["input"]
    })
}

/// Accepts `{"input": "/a"}` or a bare string.
fn pointer_argument(arguments: &Value) -> Option<&str> {
    match arguments {
        Value::String(s) => Some(s),
        other => other.get("input").and_then(Value::as_str),
    }
}

fn into_result(tool: &str, outcome: Result<String, JsonSpecError>) -> ToolResult {
    match outcome {
        Ok(output) => ToolResult::ok(output),
        Err(e) => {
            debug!(tool, error = %e, "JSON lookup failed");
            ToolResult::error(e)
        }
    }
}

pub struct JsonListKeysTool {
    spec: Arc<JsonSpec>,
}

impl JsonListKeysTool {
    pub fn new(spec: Arc<JsonSpec>) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl Tool for JsonListKeysTool {
    fn name(&self) -> &str {
        "json_list_keys"
    }

    fn description(&self) -> &str {
        "Can be used to list all keys at a given path. \
         Before calling this you should be SURE that the path to this exists. \
         The input is a text representation of the path to the json as json pointer syntax (e.g. /key1/0/key2)."
    }

    fn parameters_schema(&self) -> Value {
        pointer_schema()
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let Some(pointer) = pointer_argument(&arguments) else {
            return Ok(ToolResult::error("Missing 'input' argument"));
        };
        Ok(into_result(self.name(), self.spec.get_keys(pointer)))
    }
}

pub struct JsonGetValueTool {
    spec: Arc<JsonSpec>,
}

impl JsonGetValueTool {
    pub fn new(spec: Arc<JsonSpec>) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl Tool for JsonGetValueTool {
    fn name(&self) -> &str {
        "json_get_value"
    }

    fn description(&self) -> &str {
        "Can be used to see value in string format at a given path. \
         Before calling this you should be SURE that the path to this exists. \
         The input is a text representation of the path to the json as json pointer syntax (e.g. /key1/0/key2)."
    }

    fn parameters_schema(&self) -> Value {
        pointer_schema()
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let Some(pointer) = pointer_argument(&arguments) else {
            return Ok(ToolResult::error("Missing 'input' argument"));
        };
        Ok(into_result(self.name(), self.spec.get_value(pointer)))
    }
}
