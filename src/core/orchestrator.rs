//! Primary → fallback engine orchestration

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::errors::{EngineError, GatewayError, Result};
use crate::core::models::{EngineKind, Language};
use crate::engines::TranslationEngine;

/// Text produced by one engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub engine: EngineKind,
}

/// Fallback chain state.
///
/// `TryingPrimary → TryingFallback → Done | Exhausted`. Every request starts
/// at `TryingPrimary`; nothing is remembered between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackState {
    TryingPrimary,
    TryingFallback {
        primary_error: EngineError,
    },
    Done(Translation),
    Exhausted {
        primary_error: EngineError,
        fallback_error: EngineError,
    },
}

/// Runs one request through the primary engine, then the fallback if needed
#[derive(Clone)]
pub struct FallbackOrchestrator {
    primary: Arc<dyn TranslationEngine>,
    fallback: Arc<dyn TranslationEngine>,
}

impl FallbackOrchestrator {
    pub fn new(primary: Arc<dyn TranslationEngine>, fallback: Arc<dyn TranslationEngine>) -> Self {
        Self { primary, fallback }
    }

    /// Perform a single transition. Terminal states are returned unchanged.
    pub async fn step(
        &self,
        state: FallbackState,
        text: &str,
        source: &str,
        target: Language,
    ) -> FallbackState {
        match state {
            FallbackState::TryingPrimary => {
                match self.primary.translate(text, source, target).await {
                    Ok(text) => FallbackState::Done(Translation {
                        text,
                        engine: EngineKind::Primary,
                    }),
                    Err(primary_error) => {
                        match &primary_error {
                            EngineError::QuotaExceeded => {
                                info!("{} quota exceeded, falling back", self.primary.name())
                            }
                            EngineError::Unavailable { reason } => warn!(
                                "{} unavailable ({}), falling back",
                                self.primary.name(),
                                reason
                            ),
                        }
                        FallbackState::TryingFallback { primary_error }
                    }
                }
            }
            FallbackState::TryingFallback { primary_error } => {
                match self.fallback.translate(text, source, target).await {
                    Ok(text) => FallbackState::Done(Translation {
                        text,
                        engine: EngineKind::Fallback,
                    }),
                    Err(fallback_error) => {
                        warn!("{} also failed: {}", self.fallback.name(), fallback_error);
                        FallbackState::Exhausted {
                            primary_error,
                            fallback_error,
                        }
                    }
                }
            }
            terminal => terminal,
        }
    }

    /// Drive the chain to a terminal state
    pub async fn translate(&self, text: &str, source: &str, target: Language) -> Result<Translation> {
        let mut state = FallbackState::TryingPrimary;
        loop {
            state = match state {
                FallbackState::Done(translation) => {
                    debug!("Translated by {} engine", translation.engine);
                    return Ok(translation);
                }
                FallbackState::Exhausted { .. } => return Err(GatewayError::Exhausted),
                pending => self.step(pending, text, source, target).await,
            };
        }
    }
}
