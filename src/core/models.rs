//! Core data models for translation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::core::errors::{GatewayError, Result};

/// Source sentinel understood by providers as "infer the source language"
pub const AUTO_SOURCE: &str = "auto";

/// Supported languages with their LibreTranslate codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    English,
    Spanish,
    French,
    German,
    Chinese,
    Arabic,
    Japanese,
    Korean,
    Portuguese,
    Russian,
    Hindi,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Marathi,
    Gujarati,
    Bengali,
    Punjabi,
    Urdu,
    Odia,
    Assamese,
}

impl Language {
    /// Widely spoken languages
    pub const GLOBAL: [Language; 10] = [
        Language::English,
        Language::Spanish,
        Language::French,
        Language::German,
        Language::Chinese,
        Language::Arabic,
        Language::Japanese,
        Language::Korean,
        Language::Portuguese,
        Language::Russian,
    ];

    /// Indian regional languages
    pub const REGIONAL: [Language; 12] = [
        Language::Hindi,
        Language::Tamil,
        Language::Telugu,
        Language::Kannada,
        Language::Malayalam,
        Language::Marathi,
        Language::Gujarati,
        Language::Bengali,
        Language::Punjabi,
        Language::Urdu,
        Language::Odia,
        Language::Assamese,
    ];

    /// Every catalog language, global set first
    pub fn all() -> impl Iterator<Item = Language> {
        Self::GLOBAL.into_iter().chain(Self::REGIONAL)
    }

    /// Human-readable label, also what the generative engine is prompted with
    pub fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Chinese => "Chinese",
            Language::Arabic => "Arabic",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
            Language::Portuguese => "Portuguese",
            Language::Russian => "Russian",
            Language::Hindi => "Hindi",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
            Language::Kannada => "Kannada",
            Language::Malayalam => "Malayalam",
            Language::Marathi => "Marathi",
            Language::Gujarati => "Gujarati",
            Language::Bengali => "Bengali",
            Language::Punjabi => "Punjabi",
            Language::Urdu => "Urdu",
            Language::Odia => "Odia",
            Language::Assamese => "Assamese",
        }
    }

    /// Provider code used by the structured fallback engine
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Chinese => "zh",
            Language::Arabic => "ar",
            Language::Japanese => "ja",
            Language::Korean => "ko",
            Language::Portuguese => "pt",
            Language::Russian => "ru",
            Language::Hindi => "hi",
            Language::Tamil => "ta",
            Language::Telugu => "te",
            Language::Kannada => "kn",
            Language::Malayalam => "ml",
            Language::Marathi => "mr",
            Language::Gujarati => "gu",
            Language::Bengali => "bn",
            Language::Punjabi => "pa",
            Language::Urdu => "ur",
            Language::Odia => "or",
            Language::Assamese => "as",
        }
    }

    /// Look up a language by label or code, ignoring case and surrounding whitespace
    pub fn lookup(value: &str) -> Option<Language> {
        let value = value.trim();
        Self::all().find(|lang| {
            lang.label().eq_ignore_ascii_case(value) || lang.code().eq_ignore_ascii_case(value)
        })
    }

    /// Provider code for an arbitrary source label, `"auto"` when it has none
    pub fn code_or_auto(label: &str) -> &'static str {
        Self::lookup(label).map_or(AUTO_SOURCE, Language::code)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Language {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        Language::lookup(s).ok_or_else(|| GatewayError::UnknownLanguage {
            label: s.to_string(),
        })
    }
}

impl TryFrom<String> for Language {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.label().to_string()
    }
}

/// Source side of a language pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SourceLanguage {
    /// Let the gateway (or the provider) work it out
    AutoDetect,
    Language(Language),
}

impl SourceLanguage {
    /// Label shown in selectors
    pub const AUTO_DETECT_LABEL: &'static str = "Auto Detect";
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLanguage::AutoDetect => f.write_str(Self::AUTO_DETECT_LABEL),
            SourceLanguage::Language(lang) => f.write_str(lang.label()),
        }
    }
}

impl FromStr for SourceLanguage {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(AUTO_SOURCE)
            || trimmed.eq_ignore_ascii_case(Self::AUTO_DETECT_LABEL)
        {
            return Ok(SourceLanguage::AutoDetect);
        }
        trimmed.parse().map(SourceLanguage::Language)
    }
}

impl TryFrom<String> for SourceLanguage {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SourceLanguage> for String {
    fn from(source: SourceLanguage) -> Self {
        source.to_string()
    }
}

impl From<Language> for SourceLanguage {
    fn from(lang: Language) -> Self {
        SourceLanguage::Language(lang)
    }
}

/// Source/target pair. The target can never be auto-detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: SourceLanguage,
    pub target: Language,
}

impl LanguagePair {
    pub fn new(source: impl Into<SourceLanguage>, target: Language) -> Self {
        Self {
            source: source.into(),
            target,
        }
    }

    /// Pair with an auto-detected source
    pub fn auto(target: Language) -> Self {
        Self::new(SourceLanguage::AutoDetect, target)
    }
}

/// Translation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    text: String,
    pair: LanguagePair,
}

impl TranslationRequest {
    /// Build a request, rejecting blank text
    pub fn new(text: impl Into<String>, pair: LanguagePair) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(GatewayError::InvalidRequest {
                message: "Please enter text".to_string(),
            });
        }
        Ok(Self { text, pair })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pair(&self) -> LanguagePair {
        self.pair
    }
}

/// Which engine produced a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Primary,
    Fallback,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Primary => write!(f, "primary"),
            EngineKind::Fallback => write!(f, "fallback"),
        }
    }
}

/// Translation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translated_text: String,
    pub engine_used: EngineKind,
    /// Source label actually sent to the engines (may be `"auto"`)
    pub source_language: String,
    /// Detector output when the request asked for auto-detection and it succeeded
    pub detected_language: Option<String>,
}

/// Quota snapshot for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    /// Remaining requests in the window, clamped at zero
    pub remaining: u32,
    pub limit: u32,
    #[serde(rename = "reset_in_secs", serialize_with = "serialize_secs")]
    pub reset_in: Duration,
}

impl QuotaStatus {
    /// Status of a session that has not translated anything yet
    pub fn fresh(limit: u32) -> Self {
        Self {
            remaining: limit,
            limit,
            reset_in: Duration::ZERO,
        }
    }
}

fn serialize_secs<S: serde::Serializer>(
    d: &Duration,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

/// One past translation, kept per session for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub original: String,
    pub from: String,
    pub to: Language,
    pub translated: String,
    pub engine: EngineKind,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(request: &TranslationRequest, result: &TranslationResult, at: DateTime<Utc>) -> Self {
        Self {
            original: request.text().to_string(),
            from: result.source_language.clone(),
            to: request.pair().target,
            translated: result.translated_text.clone(),
            engine: result.engine_used,
            created_at: at,
        }
    }
}
