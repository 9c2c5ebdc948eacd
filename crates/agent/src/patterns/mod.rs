//! Agent patterns - multi-call reasoning strategies built from chains.
//!
//! 1. **Constitutional** - critique and revise a response, one principle at a time
//! 2. **Generative agent** - entity extraction, memory lookup, then a reaction

pub mod constitutional;
pub mod generative;
pub mod principles;

pub use constitutional::{ConstitutionalChain, parse_critique};
pub use generative::{GenerativeAgent, GenerativeAgentConfig, Reply, SummaryState};
pub use principles::{ConstitutionalPrinciple, PrincipleRegistry};

#[cfg(test)]
pub(crate) mod test_helpers;
