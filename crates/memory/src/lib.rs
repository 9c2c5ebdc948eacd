//! Memory implementations for Chainkit.

pub mod generative;
pub mod in_memory;

pub use generative::GenerativeAgentMemory;
pub use in_memory::InMemoryBackend;
