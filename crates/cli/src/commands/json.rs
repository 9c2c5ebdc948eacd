//! `chainkit json` - pointer inspection of a local file.

use std::path::Path;
use std::sync::Arc;

use chainkit_config::AppConfig;
use chainkit_core::tool::{ToolCall, ToolResult};
use chainkit_tools::{JsonSpec, json_registry};

use super::load_config;

pub fn load_spec(file: &Path, config: &AppConfig) -> Result<JsonSpec, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    Ok(JsonSpec::new(value).with_settings(&config.json_tools))
}

async fn call(file: &Path, tool: &str, pointer: &str) -> Result<ToolResult, Box<dyn std::error::Error>> {
    let config = load_config()?;
    let registry = json_registry(Arc::new(load_spec(file, &config)?));
    let call = ToolCall {
        id: String::new(),
        name: tool.to_string(),
        arguments: serde_json::json!({ "input": pointer }),
    };
    Ok(registry.execute(&call).await?)
}

fn report(result: ToolResult) -> Result<(), Box<dyn std::error::Error>> {
    if result.success {
        println!("{}", result.output);
        Ok(())
    } else {
        Err(result.output.into())
    }
}

pub async fn keys(file: &Path, pointer: &str) -> Result<(), Box<dyn std::error::Error>> {
    report(call(file, "json_list_keys", pointer).await?)
}

pub async fn get(file: &Path, pointer: &str) -> Result<(), Box<dyn std::error::Error>> {
    report(call(file, "json_get_value", pointer).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn spec_uses_configured_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"a": {{"b": "abcdef"}}}}"#).unwrap();

        let mut config = AppConfig::default();
        config.json_tools.max_value_length = 3;
        let spec = load_spec(file.path(), &config).unwrap();
        assert_eq!(spec.get_value("/a/b").unwrap(), "abc...");
    }

    #[test]
    fn invalid_json_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(load_spec(file.path(), &AppConfig::default()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_spec(&dir.path().join("absent.json"), &AppConfig::default()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }
}
