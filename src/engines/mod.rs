//! Translation engines and the language detector
//!
//! Engines are interchangeable behind [`TranslationEngine`]; the orchestrator
//! decides which one is primary and which one is the fallback.

pub mod detector;
pub mod gemini;
pub mod libre;
pub mod mock;

use async_trait::async_trait;

use crate::core::errors::EngineResult;
use crate::core::models::Language;

pub use detector::{Detection, GeminiDetector, LanguageDetector};
pub use gemini::{GeminiClient, GeminiEngine};
pub use libre::LibreTranslateEngine;
pub use mock::{MockDetector, MockEngine};

/// A single translation backend.
///
/// Implementations never retry; a failed call is classified into
/// [`EngineError`](crate::core::errors::EngineError) and returned.
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    /// Translate `text` from the `source` label to `target`.
    ///
    /// `source` is a catalog label, a free-text detected label, or `"auto"`.
    async fn translate(&self, text: &str, source: &str, target: Language) -> EngineResult<String>;

    /// Provider name for logs
    fn name(&self) -> &str;
}
