//! Built-in tool implementations for Chainkit.
//!
//! The JSON tools let an agent explore a large document one level at a time:
//! list the keys under a pointer, then fetch the value it actually needs.

pub mod json;

use std::sync::Arc;

use chainkit_core::tool::ToolRegistry;

pub use json::{JsonGetValueTool, JsonListKeysTool, JsonSpec, JsonSpecError};

/// A registry holding both JSON tools over the same document.
pub fn json_registry(spec: Arc<JsonSpec>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(JsonListKeysTool::new(spec.clone())));
    registry.register(Box::new(JsonGetValueTool::new(spec)));
    registry
}
