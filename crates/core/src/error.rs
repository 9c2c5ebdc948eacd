//! Error types for the Chainkit domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures raised while running a chain.
///
/// Input-contract violations (`MissingInputKeys`, `UnknownPrinciple`,
/// `InvalidInput`) are raised before any external call is issued.
/// Collaborator failures are wrapped unmodified.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Missing required input keys for {chain}: {}", keys.join(", "))]
    MissingInputKeys { chain: String, keys: Vec<String> },

    #[error("Unknown principle: {0}")]
    UnknownPrinciple(String),

    #[error("Invalid input for {key}: {reason}")]
    InvalidInput { key: String, reason: String },

    #[error("Chain {chain} returned no value for output key '{key}'")]
    MissingOutput { chain: String, key: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),
}

/// A model response did not have the shape a parser expected.
///
/// `payload` carries the JSON-serialized generations for diagnosis.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No generations to parse")]
    Empty,

    #[error("No message in generations {payload}")]
    NoMessage { payload: String },

    #[error("No function_call in message {payload}")]
    NoFunctionCall { payload: String },

    #[error("No arguments in function_call {payload}")]
    NoArguments { payload: String },

    #[error("No result from \"OutputFunctionsParser\" {payload}")]
    NoResult { payload: String },

    #[error("Invalid JSON in function call output: {reason}")]
    InvalidJson { reason: String },

    #[error("Could not parse output: {text}")]
    NoMatch { text: String },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

#[derive(Debug, Error)]
pub enum RetrieverError {
    #[error("Retriever request failed: {0}")]
    Request(String),

    #[error("Retriever endpoint returned status {status_code}: {message}")]
    Status { status_code: u16, message: String },

    #[error("Unexpected retriever response shape: {0}")]
    ResponseShape(String),
}
