//! CLI command definitions and handlers

use anyhow::Context;
use clap::Subcommand;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::core::config::GatewayConfig;
use crate::core::errors::{format_reset, GatewayError};
use crate::core::gateway::GatewayFacade;
use crate::core::models::{EngineKind, Language, LanguagePair, SourceLanguage, TranslationRequest};
use crate::core::session::Session;

/// Commands for the translation gateway
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate text or a .txt file
    Translate {
        /// Text to translate (reads --file when omitted)
        text: Option<String>,

        /// UTF-8 text file to translate
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Source language label or code, or "auto"
        #[arg(long, default_value = "auto")]
        from: String,

        /// Target language label or code
        #[arg(short, long, default_value = "Hindi")]
        to: String,

        /// Write the translation to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List supported languages
    Languages,

    /// Start HTTP API server
    Server {
        /// Bind address (default: 0.0.0.0)
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Listen port (default: 8000)
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },
}

/// Read the text to translate from the argument or the file
pub fn read_input(text: Option<String>, file: Option<&Path>) -> anyhow::Result<String> {
    match (text, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        (None, None) => anyhow::bail!("Provide text to translate or --file"),
    }
}

/// Parse CLI language arguments into a pair
pub fn parse_pair(from: &str, to: &str) -> anyhow::Result<LanguagePair> {
    let source: SourceLanguage = from.parse()?;
    let target: Language = to.parse()?;
    Ok(LanguagePair::new(source, target))
}

/// Handle translate command
pub async fn handle_translate(
    text: Option<String>,
    file: Option<PathBuf>,
    from: String,
    to: String,
    output: Option<PathBuf>,
    config: GatewayConfig,
) -> anyhow::Result<()> {
    let text = read_input(text, file.as_deref())?;
    let request = TranslationRequest::new(text, parse_pair(&from, &to)?)?;

    let gateway = GatewayFacade::from_config(&config)?;
    let session = Session::new("cli", &config);

    info!("Translating {} -> {}", request.pair().source, request.pair().target);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Translating...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let outcome = gateway.translate(&session, &request).await;
    pb.finish_and_clear();

    let result = match outcome {
        Ok(result) => result,
        Err(err @ GatewayError::QuotaExceeded { .. }) | Err(err @ GatewayError::Exhausted) => {
            eprintln!("⚠️  {}", err);
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    if let Some(detected) = &result.detected_language {
        eprintln!("🔍 Detected language: {}", detected);
    }
    let engine = match result.engine_used {
        EngineKind::Primary => "🤖 Gemini AI",
        EngineKind::Fallback => "🌍 LibreTranslate",
    };
    eprintln!("Engine used: {}", engine);

    match output {
        Some(path) => {
            std::fs::write(&path, &result.translated_text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Translation saved to {}", path.display());
        }
        None => println!("{}", result.translated_text),
    }

    let status = session.status(chrono::Utc::now()).await;
    eprintln!(
        "🆓 Free translations remaining: {} / {} (next reset in {})",
        status.remaining,
        status.limit,
        format_reset(&status.reset_in)
    );

    Ok(())
}

/// Handle languages command
pub fn handle_languages() {
    println!("Global:");
    for lang in Language::GLOBAL {
        println!("  {:<12} {}", lang.label(), lang.code());
    }
    println!("Regional:");
    for lang in Language::REGIONAL {
        println!("  {:<12} {}", lang.label(), lang.code());
    }
}

/// Handle server command
pub async fn handle_server(host: String, port: u16, config: GatewayConfig) -> anyhow::Result<()> {
    use crate::server::api::run_server;

    info!("Starting HTTP server on {}:{}", host, port);
    println!("🚀 Server starting on http://{}:{}", host, port);

    run_server(host, port, config).await?;

    Ok(())
}
