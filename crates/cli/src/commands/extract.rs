//! `chainkit extract` and `chainkit parse`.

use std::path::Path;

use chainkit_core::message::Generation;
use chainkit_core::provider::{ProviderRequest, ToolDefinition};
use chainkit_parsers::{JsonKeyOutputFunctionsParser, JsonOutputFunctionsParser, OutputParser, RegexParser};
use serde_json::Value;

use super::{chat_provider, load_config};

pub async fn run(
    text: &str,
    schema: &Path,
    function: &str,
    key: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(schema)
        .map_err(|e| format!("Failed to read {}: {e}", schema.display()))?;
    let parameters: Value = serde_json::from_str(&raw)?;

    let config = load_config()?;
    let provider = chat_provider(&config)?;

    let mut request = ProviderRequest::prompt(
        config.default_model.clone(),
        format!("Extract the requested information from the following text by calling `{function}`.\n\n{text}"),
        0.0,
    );
    request.tools.push(ToolDefinition {
        name: function.to_string(),
        description: "Record the information extracted from the text".into(),
        parameters,
    });

    let response = provider.complete(request).await?;
    let generations = vec![Generation::from(response.message)];

    let value = match key {
        Some(key) => JsonKeyOutputFunctionsParser::new(key)
            .parse_result(&generations)?
            .ok_or_else(|| format!("The model's arguments have no '{key}' field"))?,
        None => JsonOutputFunctionsParser::default().parse_result(&generations)?,
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

pub fn parse(
    text: &str,
    regex: &str,
    keys: Vec<String>,
    default_key: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut parser = RegexParser::new(regex, keys)?;
    if let Some(key) = default_key {
        parser = parser.with_default_output_key(key);
    }
    let fields = parser.parse(text)?;
    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}
