//! Chains and agent patterns for Chainkit.
//!
//! - [`LlmChain`]: prompt + provider (+ optional memory), the building block
//! - [`ConstitutionalChain`]: critique-revise loop over named principles
//! - [`GenerativeAgent`]: a persona reacting to observations with memory
//!
//! Everything here implements `chainkit_core::Chain`, so patterns compose:
//! a constitutional chain can wrap any `LlmChain`, and the generative agent
//! builds its sub-chains on demand.

pub mod llm_chain;
pub mod patterns;

pub use llm_chain::{LlmChain, output_text};
pub use patterns::{
    ConstitutionalChain, ConstitutionalPrinciple, GenerativeAgent, GenerativeAgentConfig,
    PrincipleRegistry, Reply, SummaryState,
};
