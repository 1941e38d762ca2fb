//! Gemini generative engine (primary)

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::core::config::GatewayConfig;
use crate::core::errors::{EngineError, EngineResult, Result};
use crate::core::models::Language;
use crate::engines::TranslationEngine;

const GENERATE_METHOD: &str = "generateContent";

/// Map a failed Gemini response to an engine error.
///
/// HTTP 429 and a `RESOURCE_EXHAUSTED` status in the body mean the key ran out
/// of quota; anything else is a plain outage.
pub fn classify_failure(status: StatusCode, body: &str) -> EngineError {
    if status == StatusCode::TOO_MANY_REQUESTS || body.contains("RESOURCE_EXHAUSTED") {
        return EngineError::QuotaExceeded;
    }

    let snippet: String = body.chars().take(200).collect();
    EngineError::unavailable(format!("HTTP {}: {}", status.as_u16(), snippet))
}

fn transport_failure(err: reqwest::Error) -> EngineError {
    if err.is_timeout() {
        EngineError::unavailable("request timed out")
    } else {
        EngineError::unavailable(err.to_string())
    }
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

/// Shared Gemini REST client used by both the engine and the detector
#[derive(Debug)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    configured_model: Option<String>,
    model: OnceCell<String>,
}

impl GeminiClient {
    /// Create a client from gateway configuration
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.primary_timeout_ms))
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key().map(str::to_string),
            endpoint: config.gemini_endpoint.trim_end_matches('/').to_string(),
            configured_model: config.gemini_model.clone(),
            model: OnceCell::new(),
        })
    }

    /// Whether an API key is available
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn key(&self) -> EngineResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| EngineError::unavailable("GOOGLE_API_KEY not configured"))
    }

    /// Resolve the model to call, discovering one on first use if none is configured
    async fn model(&self) -> EngineResult<&str> {
        let model = self
            .model
            .get_or_try_init(|| async {
                match &self.configured_model {
                    Some(name) => Ok(qualify_model(name)),
                    None => self.discover_model().await,
                }
            })
            .await?;
        Ok(model.as_str())
    }

    async fn discover_model(&self) -> EngineResult<String> {
        let url = format!("{}/v1beta/models", self.endpoint);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", self.key()?)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| EngineError::unavailable(format!("invalid model list: {}", e)))?;

        let model = list
            .models
            .into_iter()
            .find(|m| m.supported_generation_methods.iter().any(|g| g == GENERATE_METHOD))
            .map(|m| qualify_model(&m.name))
            .ok_or_else(|| EngineError::unavailable("no model supports generateContent"))?;

        info!("Selected Gemini model {}", model);
        Ok(model)
    }

    /// Send a single-turn prompt and return the trimmed reply text
    pub async fn generate(&self, prompt: &str) -> EngineResult<String> {
        let key = self.key()?;
        let model = self.model().await?;
        let url = format!("{}/v1beta/{}:{}", self.endpoint, model, GENERATE_METHOD);

        let body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &error_text));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EngineError::unavailable(format!("invalid response: {}", e)))?;

        let text: String = json["candidates"]
            .get(0)
            .and_then(|c| c["content"]["parts"].as_array())
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::unavailable("empty response"));
        }

        debug!("Gemini replied with {} chars", text.len());
        Ok(text.to_string())
    }
}

fn qualify_model(name: &str) -> String {
    if name.starts_with("models/") {
        name.to_string()
    } else {
        format!("models/{}", name)
    }
}

/// Prompt sent to the generative engine
pub fn translation_prompt(text: &str, source: &str, target: Language) -> String {
    format!("Translate from {} to {}:\n{}", source, target.label(), text)
}

/// Primary engine: prompts Gemini to translate
#[derive(Debug, Clone)]
pub struct GeminiEngine {
    client: Arc<GeminiClient>,
}

impl GeminiEngine {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranslationEngine for GeminiEngine {
    async fn translate(&self, text: &str, source: &str, target: Language) -> EngineResult<String> {
        let prompt = translation_prompt(text, source, target);
        self.client.generate(&prompt).await.map_err(|e| {
            warn!("Gemini translation failed: {}", e);
            e
        })
    }

    fn name(&self) -> &str {
        "Gemini"
    }
}
