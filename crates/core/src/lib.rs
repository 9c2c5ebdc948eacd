//! # Chainkit Core
//!
//! Domain types, traits, and error definitions for Chainkit.
//! This crate has **no transport dependencies**: it defines the contracts
//! (chains, providers, memory, tools, retrievers, embeddings) that the
//! other crates implement and compose.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;
pub mod chain;
pub mod prompt;
pub mod tool;
pub mod memory;
pub mod document;
pub mod embeddings;
pub mod token;

// Re-export key types at crate root for ergonomics
pub use message::{FunctionCall, Generation, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use chain::{Chain, ChainValues};
pub use prompt::PromptTemplate;
pub use tool::{Tool, ToolCall, ToolResult, ToolRegistry};
pub use memory::{AgentMemory, MemoryBackend, MemoryEntry, MemoryQuery};
pub use document::{Document, Retriever};
pub use embeddings::Embeddings;
