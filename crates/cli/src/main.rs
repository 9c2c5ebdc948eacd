//! Chainkit CLI - the main entry point.
//!
//! Commands:
//! - `critique`   - Answer a question, then critique and revise the answer
//! - `principles` - List the available critique principles
//! - `persona`    - Drive a memory-backed persona agent
//! - `embed`      - Embed texts through the Vertex AI batcher
//! - `extract`    - Ask the model for a function call and parse its arguments
//! - `parse`      - Split text with a regex into named fields
//! - `json`       - Inspect a JSON file with pointer tools
//! - `search`     - Query the configured Vespa endpoint
//! - `config`     - Show, locate, or validate the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "chainkit",
    about = "Chainkit - LLM chain and agent toolkit",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question, then critique and revise the answer
    Critique {
        /// The question to answer
        question: String,

        /// Principle to apply (repeatable); all principles when omitted
        #[arg(short, long = "principle")]
        principles: Vec<String>,
    },

    /// List the available critique principles
    Principles,

    /// Drive a memory-backed persona agent
    Persona {
        #[command(flatten)]
        persona: commands::persona::PersonaArgs,

        #[command(subcommand)]
        action: commands::persona::PersonaAction,
    },

    /// Embed texts through the Vertex AI batcher
    Embed {
        /// Texts to embed
        texts: Vec<String>,

        /// Read one text per line from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print the full vectors as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Ask the model for a function call and parse its arguments
    Extract {
        /// Text to extract from
        text: String,

        /// JSON Schema file describing the function parameters
        #[arg(short, long)]
        schema: PathBuf,

        /// Function name offered to the model
        #[arg(long, default_value = "extract")]
        function: String,

        /// Return only this argument
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Split text with a regex into named fields
    Parse {
        /// Text to parse
        text: String,

        /// Regex with one capture group per key
        #[arg(short, long)]
        regex: String,

        /// Output keys, in capture group order
        #[arg(short, long, value_delimiter = ',', required = true)]
        keys: Vec<String>,

        /// Key that receives the whole text when the regex does not match
        #[arg(short, long)]
        default_key: Option<String>,
    },

    /// Inspect a JSON file with pointer tools
    Json {
        /// The JSON document
        file: PathBuf,

        #[command(subcommand)]
        action: JsonAction,
    },

    /// Query the configured Vespa endpoint
    Search {
        /// Search query
        query: String,
    },

    /// Show, locate, or validate the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum JsonAction {
    /// List the keys of the object at a pointer
    Keys {
        #[arg(default_value = "")]
        pointer: String,
    },
    /// Print the value at a pointer
    Get { pointer: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Check the configuration for problems
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Critique { question, principles } => {
            commands::critique::run(&question, &principles).await?
        }
        Commands::Principles => commands::critique::list().await?,
        Commands::Persona { persona, action } => commands::persona::run(persona, action).await?,
        Commands::Embed { texts, file, json } => commands::embed::run(texts, file, json).await?,
        Commands::Extract {
            text,
            schema,
            function,
            key,
        } => commands::extract::run(&text, &schema, &function, key.as_deref()).await?,
        Commands::Parse {
            text,
            regex,
            keys,
            default_key,
        } => commands::extract::parse(&text, &regex, keys, default_key)?,
        Commands::Json { file, action } => match action {
            JsonAction::Keys { pointer } => commands::json::keys(&file, &pointer).await?,
            JsonAction::Get { pointer } => commands::json::get(&file, &pointer).await?,
        },
        Commands::Search { query } => commands::search::run(&query).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
    }

    Ok(())
}
