//! Message and generation domain types.
//!
//! A chain renders a prompt into a user [`Message`], the provider answers
//! with an assistant message, and output parsers inspect the resulting
//! [`Generation`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions
    System,
    /// Tool execution result
    Tool,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// Legacy single function invocation requested by the assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Optional metadata (provider info, etc.)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            function_call: None,
            timestamp: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Attach a function call to this message.
    pub fn with_function_call(mut self, call: FunctionCall) -> Self {
        self.function_call = Some(call);
        self
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as JSON string
    pub arguments: String,
}

/// A function-call payload: a named operation with string-encoded arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            arguments: Some(arguments.into()),
        }
    }
}

/// One candidate output of a model call.
///
/// Plain completions carry only text; chat completions also carry the
/// assistant message, which is where function calls live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Generation {
    Chat { text: String, message: Message },
    Text { text: String },
}

impl Generation {
    pub fn text(&self) -> &str {
        match self {
            Self::Chat { text, .. } | Self::Text { text } => text,
        }
    }

    pub fn message(&self) -> Option<&Message> {
        match self {
            Self::Chat { message, .. } => Some(message),
            Self::Text { .. } => None,
        }
    }
}

impl From<Message> for Generation {
    fn from(message: Message) -> Self {
        Self::Chat {
            text: message.content.clone(),
            message,
        }
    }
}
