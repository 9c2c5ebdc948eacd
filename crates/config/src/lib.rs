//! Configuration loading, validation, and management for Chainkit.
//!
//! Loads configuration from `~/.chainkit/config.toml` with environment
//! variable overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.chainkit/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the chat provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible chat endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Generative agent settings
    #[serde(default)]
    pub agent: AgentSection,

    /// Vertex AI embedding settings
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    /// JSON inspection tool settings
    #[serde(default)]
    pub json_tools: JsonToolsConfig,

    /// Remote retriever settings
    #[serde(default)]
    pub retriever: RetrieverConfig,

    /// Extra critique/revision principles merged over the built-ins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub principles: Vec<PrincipleConfig>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("agent", &self.agent)
            .field("embeddings", &self.embeddings)
            .field("json_tools", &self.json_tools)
            .field("retriever", &self.retriever)
            .field("principles", &self.principles)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    /// Seconds a generated self-summary stays fresh
    #[serde(default = "default_summary_refresh_seconds")]
    pub summary_refresh_seconds: u64,

    /// Token budget shared by the prompt and the most recent memories
    #[serde(default = "default_max_tokens_limit")]
    pub max_tokens_limit: usize,
}

fn default_summary_refresh_seconds() -> u64 {
    3600
}
fn default_max_tokens_limit() -> usize {
    1200
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            summary_refresh_seconds: default_summary_refresh_seconds(),
            max_tokens_limit: default_max_tokens_limit(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_vertex_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_vertex_location")]
    pub location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Maximum instances per prediction request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// OAuth access token (e.g. from `gcloud auth print-access-token`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

fn default_vertex_endpoint() -> String {
    "us-central1-aiplatform.googleapis.com".into()
}
fn default_vertex_location() -> String {
    "us-central1".into()
}
fn default_embedding_model() -> String {
    "textembedding-gecko".into()
}
fn default_chunk_size() -> usize {
    5
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_vertex_endpoint(),
            location: default_vertex_location(),
            project_id: None,
            model: default_embedding_model(),
            chunk_size: default_chunk_size(),
            access_token: None,
        }
    }
}

impl std::fmt::Debug for EmbeddingsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingsConfig")
            .field("endpoint", &self.endpoint)
            .field("location", &self.location)
            .field("project_id", &self.project_id)
            .field("model", &self.model)
            .field("chunk_size", &self.chunk_size)
            .field("access_token", &redact(&self.access_token))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonToolsConfig {
    /// Longest value (in characters) returned before truncation
    #[serde(default = "default_max_value_length")]
    pub max_value_length: usize,
}

fn default_max_value_length() -> usize {
    4000
}

impl Default for JsonToolsConfig {
    fn default() -> Self {
        Self {
            max_value_length: default_max_value_length(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RetrieverConfig {
    /// Base URL of the search backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Document field holding the page content
    #[serde(default = "default_content_field")]
    pub content_field: String,

    /// Static request body merged with the query
    #[serde(default = "default_query_body")]
    pub query_body: serde_json::Map<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

fn default_content_field() -> String {
    "content".into()
}
fn default_query_body() -> serde_json::Map<String, serde_json::Value> {
    let mut body = serde_json::Map::new();
    body.insert("yql".into(), "select content from paragraph where userQuery()".into());
    body.insert("hits".into(), 5.into());
    body.insert("ranking".into(), "documentation".into());
    body.insert("locale".into(), "en-us".into());
    body
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            url: None,
            content_field: default_content_field(),
            query_body: default_query_body(),
            auth_token: None,
        }
    }
}

impl std::fmt::Debug for RetrieverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrieverConfig")
            .field("url", &self.url)
            .field("content_field", &self.content_field)
            .field("query_body", &self.query_body)
            .field("auth_token", &redact(&self.auth_token))
            .finish()
    }
}

/// A user-defined critique/revision principle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipleConfig {
    pub name: String,
    pub critique_request: String,
    pub revision_request: String,
}

impl AppConfig {
    /// Load configuration from the default path (~/.chainkit/config.toml).
    ///
    /// Environment variables override file values:
    /// - `CHAINKIT_API_KEY`, then `OPENAI_API_KEY`
    /// - `CHAINKIT_BASE_URL`, `CHAINKIT_MODEL`
    /// - `GOOGLE_VERTEX_AI_ACCESS_TOKEN`, `GOOGLE_CLOUD_PROJECT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("CHAINKIT_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }
        if let Ok(url) = std::env::var("CHAINKIT_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(model) = std::env::var("CHAINKIT_MODEL") {
            self.default_model = model;
        }
        if self.embeddings.access_token.is_none() {
            self.embeddings.access_token = std::env::var("GOOGLE_VERTEX_AI_ACCESS_TOKEN").ok();
        }
        if self.embeddings.project_id.is_none() {
            self.embeddings.project_id = std::env::var("GOOGLE_CLOUD_PROJECT").ok();
        }
    }

    /// Get the configuration directory path.
    ///
    /// `CHAINKIT_HOME` overrides the default `~/.chainkit`.
    pub fn config_dir() -> PathBuf {
        match std::env::var("CHAINKIT_HOME") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs_home().join(".chainkit"),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.embeddings.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "embeddings.chunk_size must be at least 1".into(),
            ));
        }

        if self.json_tools.max_value_length == 0 {
            return Err(ConfigError::ValidationError(
                "json_tools.max_value_length must be at least 1".into(),
            ));
        }

        if let Some(p) = self.principles.iter().find(|p| p.name.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "principle with critique '{}' has an empty name",
                p.critique_request
            )));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            agent: AgentSection::default(),
            embeddings: EmbeddingsConfig::default(),
            json_tools: JsonToolsConfig::default(),
            retriever: RetrieverConfig::default(),
            principles: vec![],
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
