//! Gateway facade: the single entry point for the presentation layer

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::config::GatewayConfig;
use crate::core::errors::{GatewayError, Result};
use crate::core::models::{
    QuotaStatus, SourceLanguage, TranslationRequest, TranslationResult, AUTO_SOURCE,
};
use crate::core::orchestrator::FallbackOrchestrator;
use crate::core::session::Session;
use crate::engines::{
    Detection, GeminiClient, GeminiDetector, GeminiEngine, LanguageDetector,
    LibreTranslateEngine, TranslationEngine,
};

/// Quota-checked, detection-aware translation entry point
#[derive(Clone)]
pub struct GatewayFacade {
    orchestrator: FallbackOrchestrator,
    detector: Option<Arc<dyn LanguageDetector>>,
}

impl GatewayFacade {
    /// Wire the gateway from explicit engines
    pub fn new(
        primary: Arc<dyn TranslationEngine>,
        fallback: Arc<dyn TranslationEngine>,
        detector: Option<Arc<dyn LanguageDetector>>,
    ) -> Self {
        Self {
            orchestrator: FallbackOrchestrator::new(primary, fallback),
            detector,
        }
    }

    /// Gemini primary + LibreTranslate fallback from configuration
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let gemini = Arc::new(GeminiClient::new(config)?);
        let fallback = Arc::new(LibreTranslateEngine::new(config)?);

        let detector: Option<Arc<dyn LanguageDetector>> =
            if config.detect_language && gemini.is_configured() {
                Some(Arc::new(GeminiDetector::new(gemini.clone())))
            } else {
                None
            };

        info!(
            "Gateway ready: primary={}, detection={}",
            if gemini.is_configured() { "gemini" } else { "disabled" },
            detector.is_some()
        );

        Ok(Self::new(
            Arc::new(GeminiEngine::new(gemini)),
            fallback,
            detector,
        ))
    }

    /// Quota status for display
    pub async fn status(&self, session: &Session, now: DateTime<Utc>) -> QuotaStatus {
        session.status(now).await
    }

    /// Translate using the wall clock
    pub async fn translate(
        &self,
        session: &Session,
        request: &TranslationRequest,
    ) -> Result<TranslationResult> {
        self.translate_at(session, request, Utc::now()).await
    }

    /// Translate as of `now`.
    ///
    /// The session lock is held for the whole call. Quota is only consumed
    /// when a translation is returned.
    pub async fn translate_at(
        &self,
        session: &Session,
        request: &TranslationRequest,
        now: DateTime<Utc>,
    ) -> Result<TranslationResult> {
        let mut state = session.lock().await;

        let remaining = state.quota.remaining(now);
        if remaining <= 0 {
            let reset_in = state.quota.time_until_reset(now);
            info!("Session {} over quota, resets in {:?}", session.id(), reset_in);
            return Err(GatewayError::QuotaExceeded { reset_in });
        }

        let pair = request.pair();
        state.selection = pair;

        let (source, detected_language) = match pair.source {
            SourceLanguage::Language(lang) => (lang.label().to_string(), None),
            SourceLanguage::AutoDetect => match self.detect(request.text()).await {
                Detection::Detected(label) => (label.clone(), Some(label)),
                Detection::Unavailable => (AUTO_SOURCE.to_string(), None),
            },
        };

        debug!("Translating {} -> {}", source, pair.target);
        let translation = self
            .orchestrator
            .translate(request.text(), &source, pair.target)
            .await
            .map_err(|e| {
                warn!("Session {}: {}", session.id(), e);
                e
            })?;

        state.quota.record(now);

        let result = TranslationResult {
            translated_text: translation.text,
            engine_used: translation.engine,
            source_language: source,
            detected_language,
        };
        state.push_history(request, &result, now);

        info!(
            "Session {} translated via {} engine, {} remaining",
            session.id(),
            result.engine_used,
            remaining - 1
        );
        Ok(result)
    }

    async fn detect(&self, text: &str) -> Detection {
        match &self.detector {
            Some(detector) => detector.detect(text).await,
            None => Detection::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{EngineKind, Language, LanguagePair};
    use crate::engines::{MockDetector, MockEngine};
    use chrono::{Duration as TimeDelta, TimeZone};
    use std::time::Duration;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn session_with_limit(limit: u32) -> Session {
        let config = GatewayConfig {
            free_limit: limit,
            ..Default::default()
        };
        Session::new("test", &config)
    }

    fn en_hi(text: &str) -> TranslationRequest {
        TranslationRequest::new(text, LanguagePair::new(Language::English, Language::Hindi))
            .unwrap()
    }

    #[tokio::test]
    async fn test_fallback_after_primary_rate_limit() {
        let primary = Arc::new(MockEngine::rate_limited());
        let fallback = Arc::new(MockEngine::translating("नमस्ते"));
        let gateway = GatewayFacade::new(primary.clone(), fallback.clone(), None);
        let session = session_with_limit(20);

        let result = gateway.translate_at(&session, &en_hi("Hello"), t0()).await.unwrap();

        assert_eq!(result.translated_text, "नमस्ते");
        assert_eq!(result.engine_used, EngineKind::Fallback);
        assert_eq!(fallback.calls()[0].source, "English");
        assert_eq!(fallback.calls()[0].target, Language::Hindi);
        assert_eq!(session.status(t0()).await.remaining, 19);
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let primary = Arc::new(MockEngine::translating("नमस्ते"));
        let fallback = Arc::new(MockEngine::suffix());
        let gateway = GatewayFacade::new(primary.clone(), fallback.clone(), None);
        let session = session_with_limit(20);

        let result = gateway.translate_at(&session, &en_hi("Hello"), t0()).await.unwrap();

        assert_eq!(result.engine_used, EngineKind::Primary);
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn test_over_quota_rejects_without_engine_calls() {
        let primary = Arc::new(MockEngine::suffix());
        let fallback = Arc::new(MockEngine::suffix());
        let gateway = GatewayFacade::new(primary.clone(), fallback.clone(), None);
        let session = session_with_limit(1);

        gateway.translate_at(&session, &en_hi("one"), t0()).await.unwrap();
        let later = t0() + TimeDelta::hours(2);
        let err = gateway.translate_at(&session, &en_hi("two"), later).await.unwrap_err();

        match err {
            GatewayError::QuotaExceeded { reset_in } => {
                assert_eq!(reset_in, Duration::from_secs(22 * 3600));
            }
            other => panic!("expected QuotaExceeded, got {other:?}"),
        }
        assert_eq!(primary.call_count(), 1);
        assert_eq!(fallback.call_count(), 0);
        assert_eq!(session.history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_does_not_consume_quota() {
        let primary = Arc::new(MockEngine::unavailable());
        let fallback = Arc::new(MockEngine::unavailable());
        let gateway = GatewayFacade::new(primary, fallback, None);
        let session = session_with_limit(20);

        let err = gateway.translate_at(&session, &en_hi("Hello"), t0()).await.unwrap_err();

        assert!(matches!(err, GatewayError::Exhausted));
        let status = session.status(t0()).await;
        assert_eq!(status.remaining, 20);
        assert_eq!(status.reset_in, Duration::ZERO);
        assert!(session.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_auto_detect_unavailable_sends_auto() {
        let primary = Arc::new(MockEngine::unavailable());
        let fallback = Arc::new(MockEngine::suffix());
        let detector = Arc::new(MockDetector::unavailable());
        let gateway =
            GatewayFacade::new(primary.clone(), fallback.clone(), Some(detector.clone()));
        let session = session_with_limit(20);
        let request =
            TranslationRequest::new("Bonjour", LanguagePair::auto(Language::English)).unwrap();

        let result = gateway.translate_at(&session, &request, t0()).await.unwrap();

        assert_eq!(detector.call_count(), 1);
        assert_eq!(primary.calls()[0].source, "auto");
        assert_eq!(fallback.calls()[0].source, "auto");
        assert_eq!(result.source_language, "auto");
        assert_eq!(result.detected_language, None);
    }

    #[tokio::test]
    async fn test_auto_detect_without_detector_sends_auto() {
        let primary = Arc::new(MockEngine::suffix());
        let gateway = GatewayFacade::new(primary.clone(), Arc::new(MockEngine::suffix()), None);
        let session = session_with_limit(20);
        let request =
            TranslationRequest::new("Bonjour", LanguagePair::auto(Language::English)).unwrap();

        gateway.translate_at(&session, &request, t0()).await.unwrap();

        assert_eq!(primary.calls()[0].source, "auto");
    }

    #[tokio::test]
    async fn test_auto_detect_substitutes_detected_label() {
        let primary = Arc::new(MockEngine::suffix());
        let detector = Arc::new(MockDetector::detecting("French"));
        let gateway =
            GatewayFacade::new(primary.clone(), Arc::new(MockEngine::suffix()), Some(detector));
        let session = session_with_limit(20);
        let request =
            TranslationRequest::new("Bonjour", LanguagePair::auto(Language::English)).unwrap();

        let result = gateway.translate_at(&session, &request, t0()).await.unwrap();

        assert_eq!(primary.calls()[0].source, "French");
        assert_eq!(result.detected_language.as_deref(), Some("French"));
        assert_eq!(session.history().await[0].from, "French");
    }

    #[tokio::test]
    async fn test_explicit_source_skips_detector() {
        let detector = Arc::new(MockDetector::detecting("French"));
        let gateway = GatewayFacade::new(
            Arc::new(MockEngine::suffix()),
            Arc::new(MockEngine::suffix()),
            Some(detector.clone()),
        );
        let session = session_with_limit(20);

        gateway.translate_at(&session, &en_hi("Hello"), t0()).await.unwrap();

        assert_eq!(detector.call_count(), 0);
    }

    #[tokio::test]
    async fn test_records_only_successes() {
        let session = session_with_limit(3);
        let ok = GatewayFacade::new(
            Arc::new(MockEngine::suffix()),
            Arc::new(MockEngine::suffix()),
            None,
        );
        let down = GatewayFacade::new(
            Arc::new(MockEngine::unavailable()),
            Arc::new(MockEngine::unavailable()),
            None,
        );

        ok.translate_at(&session, &en_hi("a"), t0()).await.unwrap();
        assert!(down.translate_at(&session, &en_hi("b"), t0()).await.is_err());
        ok.translate_at(&session, &en_hi("c"), t0()).await.unwrap();

        assert_eq!(session.status(t0()).await.remaining, 1);
        assert_eq!(session.history().await.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_never_overshoot_quota() {
        let session = Arc::new(session_with_limit(3));
        let gateway = GatewayFacade::new(
            Arc::new(MockEngine::suffix()),
            Arc::new(MockEngine::suffix()),
            None,
        );

        let mut handles = Vec::new();
        for i in 0..8 {
            let session = session.clone();
            let gateway = gateway.clone();
            handles.push(tokio::spawn(async move {
                gateway.translate_at(&session, &en_hi(&format!("text {i}")), t0()).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 3);
        assert_eq!(session.lock().await.quota.remaining(t0()), 0);
    }
}
