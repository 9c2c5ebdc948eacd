//! Output parsers for Chainkit.
//!
//! Parsers turn model generations into structured values:
//! - [`OutputFunctionsParser`]: the raw function-call arguments (or the whole call)
//! - [`JsonOutputFunctionsParser`]: the same, parsed as JSON
//! - [`JsonKeyOutputFunctionsParser`]: one field of the parsed arguments
//! - [`RegexParser`]: named capture groups of a plain text reply

pub mod functions;
pub mod regex;

pub use functions::{JsonKeyOutputFunctionsParser, JsonOutputFunctionsParser, OutputFunctionsParser};
pub use regex::RegexParser;

use chainkit_core::error::ParseError;
use chainkit_core::message::Generation;

/// Turns a model's generations into a typed value.
pub trait OutputParser: Send + Sync {
    type Output;

    fn parse_result(&self, generations: &[Generation]) -> Result<Self::Output, ParseError>;
}

/// JSON rendering of generations attached to parse errors.
pub(crate) fn payload(generations: &[Generation]) -> String {
    serde_json::to_string(generations).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}
