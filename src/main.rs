//! Main entry point for the translang CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use translang_gateway::cli::commands::{self, Commands};
use translang_gateway::GatewayConfig;

/// Translang - quota-aware translation gateway
#[derive(Parser, Debug)]
#[command(name = "translang", version, about, long_about = None)]
struct Args {
    /// Gemini API key (optional, defaults to GOOGLE_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Override the free translation limit per window
    #[arg(long)]
    free_limit: Option<u32>,

    /// Override the rolling window length in hours
    #[arg(long)]
    window_hours: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("translang_gateway={0},translang={0}", default_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = GatewayConfig::load(args.config.as_deref())?;

    // Override config with CLI args if provided
    if let Some(api_key) = args.api_key {
        config.google_api_key = Some(api_key);
    }
    if let Some(free_limit) = args.free_limit {
        config.free_limit = free_limit;
    }
    if let Some(window_hours) = args.window_hours {
        config.window_hours = window_hours;
    }
    config.validate()?;

    // Execute command
    match args.command {
        Some(Commands::Translate {
            text,
            file,
            from,
            to,
            output,
        }) => {
            commands::handle_translate(text, file, from, to, output, config).await?;
        }
        Some(Commands::Languages) => {
            commands::handle_languages();
        }
        Some(Commands::Server { host, port }) => {
            commands::handle_server(host, port, config).await?;
        }
        None => {
            println!("Please specify a command. Use --help for more information.");
        }
    }

    Ok(())
}
