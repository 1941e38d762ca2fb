//! HTTP API server implementation

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::config::GatewayConfig;
use crate::core::errors::GatewayError;
use crate::core::gateway::GatewayFacade;
use crate::core::models::{
    EngineKind, HistoryEntry, Language, LanguagePair, QuotaStatus, SourceLanguage,
    TranslationRequest,
};
use crate::core::session::{Session, SessionStore};

/// Header carrying the caller's session id
pub const SESSION_HEADER: &str = "x-session-id";

/// How often the server drops idle sessions
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Application state
#[derive(Clone)]
pub struct AppState {
    gateway: Arc<GatewayFacade>,
    sessions: Arc<SessionStore>,
    config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(gateway: GatewayFacade, config: GatewayConfig) -> Self {
        Self {
            gateway: Arc::new(gateway),
            sessions: Arc::new(SessionStore::for_config(&config)),
            config: Arc::new(config),
        }
    }

    /// Registry shared by every handler
    pub fn sessions(&self) -> Arc<SessionStore> {
        self.sessions.clone()
    }

    async fn session(&self, headers: &HeaderMap) -> Result<Arc<Session>, ApiError> {
        let id = session_id(headers)?;
        Ok(self.sessions.get_or_create(id, &self.config).await)
    }

    /// Existing session only; read-only handlers must not create one
    async fn existing_session(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<Arc<Session>>, ApiError> {
        let id = session_id(headers)?;
        Ok(self.sessions.get(id).await)
    }
}

fn session_id(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("missing {} header", SESSION_HEADER)))
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

#[derive(Serialize)]
struct LanguageInfo {
    label: &'static str,
    code: &'static str,
}

impl From<Language> for LanguageInfo {
    fn from(lang: Language) -> Self {
        Self {
            label: lang.label(),
            code: lang.code(),
        }
    }
}

/// Language catalog response
#[derive(Serialize)]
struct LanguagesResponse {
    global: Vec<LanguageInfo>,
    regional: Vec<LanguageInfo>,
}

/// Translation request body
#[derive(Deserialize)]
pub struct TranslateBody {
    pub text: String,
    pub source_lang: Option<String>,
    pub target_lang: String,
}

/// Translation response body
#[derive(Serialize)]
pub struct TranslateResponse {
    pub translated_text: String,
    pub engine: EngineKind,
    pub source_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_lang: Option<String>,
    pub quota: QuotaStatus,
}

#[derive(Serialize)]
struct HistoryResponse {
    entries: Vec<HistoryEntry>,
}

#[derive(Serialize)]
struct SelectionResponse {
    selection: LanguagePair,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_in_secs: Option<u64>,
}

/// Error mapped to an HTTP status and JSON body
pub struct ApiError {
    status: StatusCode,
    detail: ErrorDetail,
}

impl ApiError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: ErrorDetail {
                message,
                code: "invalid_request".to_string(),
                reset_in_secs: None,
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let (status, code, reset_in_secs) = match &err {
            GatewayError::QuotaExceeded { reset_in } => (
                StatusCode::TOO_MANY_REQUESTS,
                "quota_exceeded",
                Some(reset_in.as_secs()),
            ),
            GatewayError::Exhausted => (StatusCode::SERVICE_UNAVAILABLE, "engines_exhausted", None),
            GatewayError::InvalidRequest { .. } | GatewayError::UnknownLanguage { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_request", None)
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
        };

        Self {
            status,
            detail: ErrorDetail {
                message: err.to_string(),
                code: code.to_string(),
                reset_in_secs,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.detail })).into_response()
    }
}

/// Health check handler
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: crate::NAME.to_string(),
        version: crate::VERSION.to_string(),
    })
}

/// Language catalog handler
async fn get_languages() -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        global: Language::GLOBAL.into_iter().map(LanguageInfo::from).collect(),
        regional: Language::REGIONAL.into_iter().map(LanguageInfo::from).collect(),
    })
}

/// Quota status handler
async fn get_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<QuotaStatus>, ApiError> {
    let status = match state.existing_session(&headers).await? {
        Some(session) => state.gateway.status(&session, Utc::now()).await,
        None => QuotaStatus::fresh(state.config.free_limit),
    };
    Ok(Json(status))
}

/// Translation handler
async fn translate(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<TranslateBody>, JsonRejection>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let Json(payload) = payload?;
    let session = state.session(&headers).await?;

    let source: SourceLanguage = match payload.source_lang.as_deref() {
        Some(label) => label.parse()?,
        None => SourceLanguage::AutoDetect,
    };
    let target: Language = payload.target_lang.parse()?;
    let request = TranslationRequest::new(payload.text, LanguagePair::new(source, target))?;

    let result = state
        .gateway
        .translate(&session, &request)
        .await
        .map_err(|e| {
            warn!("Translation failed for session {}: {}", session.id(), e);
            ApiError::from(e)
        })?;

    Ok(Json(TranslateResponse {
        translated_text: result.translated_text,
        engine: result.engine_used,
        source_lang: result.source_language,
        detected_lang: result.detected_language,
        quota: session.status(Utc::now()).await,
    }))
}

/// History handler
async fn get_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<HistoryResponse>, ApiError> {
    let entries = match state.existing_session(&headers).await? {
        Some(session) => session.history().await,
        None => Vec::new(),
    };
    Ok(Json(HistoryResponse { entries }))
}

/// Swap the session's selected languages
async fn swap_languages(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SelectionResponse>, ApiError> {
    let session = state.session(&headers).await?;
    Ok(Json(SelectionResponse {
        selection: session.swap_languages().await,
    }))
}

/// End the session
async fn end_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let id = session_id(&headers)?;
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/v1/languages", get(get_languages))
        .route("/v1/status", get(get_status))
        .route("/v1/translate", post(translate))
        .route("/v1/history", get(get_history))
        .route("/v1/session/swap", post(swap_languages))
        .route("/v1/session", axum::routing::delete(end_session))
        .with_state(state)
}

fn spawn_session_sweeper(sessions: Arc<SessionStore>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let evicted = sessions.evict_idle(Utc::now()).await;
            if evicted > 0 {
                debug!("{} sessions live after sweep", sessions.len().await);
            }
        }
    });
}

/// Run the HTTP server
pub async fn run_server(host: String, port: u16, config: GatewayConfig) -> anyhow::Result<()> {
    let gateway = GatewayFacade::from_config(&config)?;
    let state = AppState::new(gateway, config);
    spawn_session_sweeper(state.sessions());
    let app = router(state);

    // Bind address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
