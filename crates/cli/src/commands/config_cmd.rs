//! `chainkit config` - Configuration management commands.

use chainkit_config::AppConfig;

/// Non-fatal problems worth showing next to a valid config.
pub fn warnings(config: &AppConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if config.api_key.is_none() {
        warnings.push("No API key set (set CHAINKIT_API_KEY or OPENAI_API_KEY)");
    }
    if config.embeddings.project_id.is_none() {
        warnings.push("embeddings.project_id is not set; `embed` will not work");
    }
    if config.embeddings.access_token.is_none() {
        warnings.push("No Vertex AI access token (set GOOGLE_VERTEX_AI_ACCESS_TOKEN)");
    }
    if config.retriever.url.is_none() {
        warnings.push("retriever.url is not set; `search` will not work");
    }
    warnings
}

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ok  Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   ok  All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   warn  {w}");
                }
            }

            println!();
            println!("   Base URL:    {}", config.base_url);
            println!("   Model:       {}", config.default_model);
            println!("   Embeddings:  {} (chunks of {})", config.embeddings.model, config.embeddings.chunk_size);
            println!("   Principles:  {} custom", config.principles.len());
        }
        Err(e) => {
            println!("   error  Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    config.api_key = config.api_key.map(|_| "[REDACTED]".into());
    config.embeddings.access_token = config.embeddings.access_token.map(|_| "[REDACTED]".into());
    config.retriever.auth_token = config.retriever.auth_token.map(|_| "[REDACTED]".into());
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
