//! Translang Gateway - quota-aware translation gateway
//!
//! This library routes text translation requests to a generative primary
//! engine (Gemini) with a structured fallback (LibreTranslate), enforcing a
//! per-session rolling-window quota. CLI and HTTP surfaces sit on top.

#![forbid(unsafe_code)]

pub mod cli;
pub mod core;
pub mod engines;
pub mod server;

// Re-export key types for convenience
pub use core::{
    config::GatewayConfig,
    errors::{EngineError, GatewayError},
    gateway::GatewayFacade,
    models::{
        EngineKind, HistoryEntry, Language, LanguagePair, QuotaStatus, SourceLanguage,
        TranslationRequest, TranslationResult,
    },
    orchestrator::{FallbackOrchestrator, FallbackState},
    quota::QuotaTracker,
    session::{Session, SessionStore},
};

pub use engines::{LanguageDetector, TranslationEngine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
