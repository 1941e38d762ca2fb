//! Mock engine and detector for testing
//!
//! Deterministic, network-free stand-ins that record every call so tests can
//! assert which engines were reached and with which languages.
//!
//! # Example
//!
//! ```ignore
//! let fallback = MockEngine::translating("नमस्ते");
//! let result = fallback.translate("Hello", "en", Language::Hindi).await?;
//! assert_eq!(fallback.calls().len(), 1);
//! ```

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::core::errors::{EngineError, EngineResult};
use crate::core::models::Language;
use crate::engines::detector::{Detection, LanguageDetector};
use crate::engines::TranslationEngine;

/// One recorded engine invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCall {
    pub text: String,
    pub source: String,
    pub target: Language,
}

#[derive(Debug, Clone)]
enum MockMode {
    /// Append the target code: "hello" -> "hello_hi"
    Suffix,
    /// Always return this text
    Fixed(String),
    /// Always fail with this error
    Fail(EngineError),
}

/// Scripted translation engine
#[derive(Debug)]
pub struct MockEngine {
    mode: MockMode,
    calls: Mutex<Vec<EngineCall>>,
}

impl MockEngine {
    fn with_mode(mode: MockMode) -> Self {
        Self {
            mode,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Engine that appends the target code to the input
    pub fn suffix() -> Self {
        Self::with_mode(MockMode::Suffix)
    }

    /// Engine that always answers `text`
    pub fn translating(text: impl Into<String>) -> Self {
        Self::with_mode(MockMode::Fixed(text.into()))
    }

    /// Engine that always fails with `error`
    pub fn failing(error: EngineError) -> Self {
        Self::with_mode(MockMode::Fail(error))
    }

    /// Engine that always reports a provider rate limit
    pub fn rate_limited() -> Self {
        Self::failing(EngineError::QuotaExceeded)
    }

    /// Engine that is always down
    pub fn unavailable() -> Self {
        Self::failing(EngineError::unavailable("mock outage"))
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl TranslationEngine for MockEngine {
    async fn translate(&self, text: &str, source: &str, target: Language) -> EngineResult<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(EngineCall {
                text: text.to_string(),
                source: source.to_string(),
                target,
            });
        }

        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target.code())),
            MockMode::Fixed(reply) => Ok(reply.clone()),
            MockMode::Fail(error) => Err(error.clone()),
        }
    }

    fn name(&self) -> &str {
        "Mock"
    }
}

/// Detector returning a fixed answer
#[derive(Debug)]
pub struct MockDetector {
    answer: Detection,
    calls: AtomicUsize,
}

impl MockDetector {
    pub fn detecting(label: impl Into<String>) -> Self {
        Self {
            answer: Detection::Detected(label.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            answer: Detection::Unavailable,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageDetector for MockDetector {
    async fn detect(&self, _text: &str) -> Detection {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}
