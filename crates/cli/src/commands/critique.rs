//! `chainkit critique` and `chainkit principles`.

use std::sync::Arc;

use chainkit_agent::{ConstitutionalChain, ConstitutionalPrinciple, LlmChain, PrincipleRegistry};
use chainkit_config::AppConfig;
use chainkit_core::chain::{Chain, ChainValues};
use chainkit_core::prompt::PromptTemplate;

use super::{chat_provider, load_config};

/// Built-ins with the config's `[[principles]]` layered on top.
pub fn registry(config: &AppConfig) -> PrincipleRegistry {
    PrincipleRegistry::builtin().with_principles(
        config
            .principles
            .iter()
            .map(ConstitutionalPrinciple::from),
    )
}

pub async fn run(question: &str, names: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let principles = registry(&config).resolve(names)?;
    let provider = chat_provider(&config)?;

    let base = Arc::new(
        LlmChain::new(
            provider.clone(),
            config.default_model.clone(),
            PromptTemplate::from_template("{question}"),
        )
        .with_temperature(config.default_temperature),
    );
    let chain = ConstitutionalChain::from_llm(provider, config.default_model.clone(), base, principles);

    let outputs = chain.call(ChainValues::new().with("question", question)).await?;
    println!("{}", outputs.get_text("output").unwrap_or_default());
    Ok(())
}

pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let registry = registry(&config);

    println!("{} principles", registry.len());
    println!();
    for principle in registry.all() {
        println!("  {}", principle.name);
        println!("    critique: {}", principle.critique_request);
        println!("    revision: {}", principle.revision_request);
    }
    Ok(())
}
