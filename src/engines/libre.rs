//! LibreTranslate structured engine (fallback)

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::config::GatewayConfig;
use crate::core::errors::{EngineError, EngineResult, Result};
use crate::core::models::Language;
use crate::engines::TranslationEngine;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibreResponse {
    translated_text: Option<String>,
}

/// Fallback engine calling a LibreTranslate `/translate` endpoint
#[derive(Debug, Clone)]
pub struct LibreTranslateEngine {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl LibreTranslateEngine {
    /// Create the engine with the configured (short) timeout
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.fallback_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            url: config.libretranslate_url.clone(),
            api_key: config
                .libretranslate_api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
        })
    }

    /// Form fields for one request. Unknown source labels become `"auto"`.
    pub fn form(&self, text: &str, source: &str, target: Language) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("q", text.to_string()),
            ("source", Language::code_or_auto(source).to_string()),
            ("target", target.code().to_string()),
            ("format", "text".to_string()),
        ];
        if let Some(key) = &self.api_key {
            form.push(("api_key", key.clone()));
        }
        form
    }
}

#[async_trait]
impl TranslationEngine for LibreTranslateEngine {
    async fn translate(&self, text: &str, source: &str, target: Language) -> EngineResult<String> {
        let form = self.form(text, source, target);
        debug!("LibreTranslate request {:?} -> {}", form[1].1, form[2].1);

        let response = self
            .client
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                warn!("LibreTranslate request failed: {}", e);
                EngineError::unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("LibreTranslate returned HTTP {}", status.as_u16());
            return Err(EngineError::unavailable(format!("HTTP {}", status.as_u16())));
        }

        let body: LibreResponse = response
            .json()
            .await
            .map_err(|e| EngineError::unavailable(format!("invalid response: {}", e)))?;

        // Returned as-is; blank output counts as a failure
        body.translated_text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| EngineError::unavailable("no translatedText in response"))
    }

    fn name(&self) -> &str {
        "LibreTranslate"
    }
}
