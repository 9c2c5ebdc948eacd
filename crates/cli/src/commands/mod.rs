pub mod config_cmd;
pub mod critique;
pub mod embed;
pub mod extract;
pub mod json;
pub mod persona;
pub mod search;

use std::sync::Arc;

use chainkit_config::AppConfig;
use chainkit_core::provider::Provider;

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Chat provider from config, with setup hints when the key is missing.
pub fn chat_provider(config: &AppConfig) -> Result<Arc<dyn Provider>, Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    CHAINKIT_API_KEY=sk-...");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!();
        eprintln!("  Or add api_key to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }
    Ok(Arc::new(chainkit_providers::provider_from_config(config)?))
}
