//! Best-effort source language detection

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::models::Language;
use crate::engines::gemini::GeminiClient;

/// Outcome of a detection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Language label to hand to the engines
    Detected(String),
    /// Detector missing, failed, or returned nothing usable
    Unavailable,
}

impl Detection {
    /// Normalize a raw provider reply.
    ///
    /// Catalog languages are mapped to their canonical label; any other
    /// non-empty reply is kept verbatim.
    pub fn from_reply(reply: &str) -> Self {
        let reply = reply.trim();
        if reply.is_empty() {
            return Detection::Unavailable;
        }
        match Language::lookup(reply) {
            Some(lang) => Detection::Detected(lang.label().to_string()),
            None => Detection::Detected(reply.to_string()),
        }
    }
}

/// Infers the language of a text. Never fails; failures are `Unavailable`.
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    async fn detect(&self, text: &str) -> Detection;
}

/// Detector asking Gemini to name the language
#[derive(Debug, Clone)]
pub struct GeminiDetector {
    client: Arc<GeminiClient>,
}

impl GeminiDetector {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LanguageDetector for GeminiDetector {
    async fn detect(&self, text: &str) -> Detection {
        let prompt = format!("Detect the language:\n{}", text);
        match self.client.generate(&prompt).await {
            Ok(reply) => {
                let detection = Detection::from_reply(&reply);
                debug!("Detected language: {:?}", detection);
                detection
            }
            Err(e) => {
                warn!("Language detection unavailable: {}", e);
                Detection::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GatewayConfig;

    #[test]
    fn test_reply_normalization() {
        assert_eq!(
            Detection::from_reply("  french\n"),
            Detection::Detected("French".to_string())
        );
        assert_eq!(
            Detection::from_reply("Latin"),
            Detection::Detected("Latin".to_string())
        );
        assert_eq!(Detection::from_reply("   "), Detection::Unavailable);
    }

    #[tokio::test]
    async fn test_unconfigured_detector_is_unavailable() {
        let client = Arc::new(GeminiClient::new(&GatewayConfig::default()).unwrap());
        let detector = GeminiDetector::new(client);
        assert_eq!(detector.detect("Bonjour").await, Detection::Unavailable);
    }
}
