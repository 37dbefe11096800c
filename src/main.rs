//! Main entry point for the LLM Translator CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use llm_translator::cli::commands::{self, Commands};
use llm_translator::TranslatorConfig;

/// LLM Translator - translate text through Ollama, OpenAI or Gemini
#[derive(Parser, Debug)]
#[command(name = "llm-translator", version, about, long_about = None)]
struct Args {
    /// JSON or YAML configuration file (defaults to environment variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    let crate_target = env!("CARGO_PKG_NAME").replace('-', "_");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}={}", crate_target, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Languages are static tables and need no backend configuration
    if let Some(Commands::Languages { variant }) = &args.command {
        return commands::handle_languages(*variant);
    }

    let config = TranslatorConfig::load(args.config.as_deref())?;

    match args.command {
        Some(Commands::Serve {
            variant,
            host,
            port,
        }) => {
            commands::handle_serve(&config, variant, host, port).await?;
        }
        Some(Commands::Translate { input, show_prompt }) => {
            if !commands::handle_translate(&config, input, show_prompt).await? {
                std::process::exit(1);
            }
        }
        Some(Commands::Prompt { input }) => {
            commands::handle_prompt(&config, input)?;
        }
        Some(Commands::Models) => {
            commands::handle_models(&config)?;
        }
        Some(Commands::Languages { .. }) => unreachable!("handled before configuration is loaded"),
        None => {
            println!("Please specify a command. Use --help for more information.");
        }
    }

    Ok(())
}
