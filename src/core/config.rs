//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::core::errors::{GatewayError, Result};

/// Longest accepted rolling window (ten years)
pub const MAX_WINDOW_HOURS: u32 = 87_600;

/// Configuration for the gateway.
///
/// Field names double as environment variable names (`FREE_LIMIT`,
/// `WINDOW_HOURS`, `GOOGLE_API_KEY`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Successful translations allowed per window
    pub free_limit: u32,
    /// Rolling window length
    pub window_hours: u32,
    /// History entries kept per session
    pub max_history: usize,
    pub google_api_key: Option<String>,
    /// Gemini model name; discovered from the model list when unset
    pub gemini_model: Option<String>,
    pub gemini_endpoint: String,
    pub primary_timeout_ms: u64,
    pub libretranslate_url: String,
    pub libretranslate_api_key: Option<String>,
    pub fallback_timeout_ms: u64,
    /// Ask Gemini to detect the source language on auto-detect requests
    pub detect_language: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            free_limit: 20,
            window_hours: 24,
            max_history: 50,
            google_api_key: None,
            gemini_model: None,
            gemini_endpoint: "https://generativelanguage.googleapis.com".to_string(),
            primary_timeout_ms: 20_000,
            libretranslate_url: "https://libretranslate.de/translate".to_string(),
            libretranslate_api_key: None,
            fallback_timeout_ms: 5_000,
            detect_language: true,
        }
    }
}

impl GatewayConfig {
    /// Load defaults, then an optional file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(config::Environment::default())
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load from JSON file only
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Gemini key, if set and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.google_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.free_limit == 0 {
            return Err(config_error("free_limit must be greater than 0"));
        }

        if self.window_hours == 0 || self.window_hours > MAX_WINDOW_HOURS {
            return Err(config_error("window_hours must be between 1 and 87600"));
        }

        if self.primary_timeout_ms == 0 || self.fallback_timeout_ms == 0 {
            return Err(config_error("engine timeouts must be greater than 0"));
        }

        if self.gemini_endpoint.is_empty() {
            return Err(config_error("gemini_endpoint is required"));
        }

        if self.libretranslate_url.is_empty() {
            return Err(config_error("libretranslate_url is required"));
        }

        if self.api_key().is_none() {
            warn!("GOOGLE_API_KEY not set, primary engine and language detection are disabled");
        }

        Ok(())
    }
}

fn config_error(message: &str) -> GatewayError {
    GatewayError::ConfigError {
        message: message.to_string(),
    }
}
