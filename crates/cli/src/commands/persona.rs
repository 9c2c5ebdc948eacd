//! `chainkit persona` - a memory-backed character.
//!
//! Memory lives for one invocation; `--memory` seeds it before the first
//! observation.

use std::sync::Arc;

use chainkit_agent::{GenerativeAgent, GenerativeAgentConfig};
use chainkit_config::AppConfig;
use chainkit_core::memory::AgentMemory;
use chainkit_core::provider::Provider;
use chainkit_memory::{GenerativeAgentMemory, InMemoryBackend};
use chrono::Utc;
use clap::{Args, Subcommand};
use tracing::info;

use super::{chat_provider, load_config};

#[derive(Args)]
pub struct PersonaArgs {
    /// Character name
    #[arg(long)]
    pub name: String,

    /// Innate traits, e.g. "anxious, likes design"
    #[arg(long, default_value = "N/A")]
    pub traits: String,

    /// Current status, e.g. "on a first date"
    #[arg(long, default_value = "")]
    pub status: String,

    #[arg(long)]
    pub age: Option<u32>,

    /// Seed memory (repeatable)
    #[arg(short, long = "memory")]
    pub memories: Vec<String>,
}

#[derive(Subcommand)]
pub enum PersonaAction {
    /// React to one observation
    React { observation: String },
    /// Hold a conversation, one line per turn, until the persona says goodbye
    Talk { lines: Vec<String> },
    /// Print the persona's header and self-summary
    Summary,
}

pub async fn build_agent(
    provider: Arc<dyn Provider>,
    config: &AppConfig,
    args: &PersonaArgs,
) -> Result<GenerativeAgent, Box<dyn std::error::Error>> {
    let memory = Arc::new(
        GenerativeAgentMemory::new(Arc::new(InMemoryBackend::new()))
            .with_max_tokens_limit(config.agent.max_tokens_limit),
    );
    for seed in &args.memories {
        memory.add_memory(seed, None, Default::default()).await?;
    }

    let mut persona = GenerativeAgentConfig::new(&args.name, &args.traits, &args.status)
        .with_settings(&config.agent);
    if let Some(age) = args.age {
        persona = persona.with_age(age);
    }

    info!(name = %args.name, memories = args.memories.len(), "Persona ready");
    Ok(
        GenerativeAgent::new(provider, config.default_model.clone(), memory, persona)
            .with_temperature(config.default_temperature),
    )
}

pub async fn run(args: PersonaArgs, action: PersonaAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let provider = chat_provider(&config)?;
    let agent = build_agent(provider, &config, &args).await?;

    match action {
        PersonaAction::React { observation } => {
            let (_, reaction) = agent.generate_reaction(&observation, Some(Utc::now())).await?;
            println!("{reaction}");
        }
        PersonaAction::Talk { lines } => {
            for line in lines {
                println!("> {line}");
                let (keep_going, reply) = agent
                    .generate_dialogue_response(&line, Some(Utc::now()))
                    .await?;
                println!("{reply}");
                if !keep_going {
                    break;
                }
            }
        }
        PersonaAction::Summary => {
            println!("{}", agent.get_full_header(Utc::now(), true).await?);
        }
    }
    Ok(())
}
