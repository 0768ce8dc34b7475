use super::state::AppState;
use crate::error::SessionError;
use crate::session::{StartOptions, StartOutcome};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    /// Requested language code (e.g. "en-US"); falls back to the default
    pub language: Option<String>,

    /// Stream live hypotheses instead of blocking until the final result
    #[serde(default)]
    pub partial_results: bool,

    /// Override the configured alternatives bound
    pub max_results: Option<usize>,

    /// Optional prompt for engines that support one
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StartResponse {
    /// Streaming session is live
    Started { started: bool },
    /// One-shot session finished with its transcript
    Finished { matches: Vec<String> },
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub stopped: bool,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_status(err: &SessionError) -> StatusCode {
    match err {
        SessionError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        SessionError::PermissionDenied => StatusCode::FORBIDDEN,
        SessionError::AlreadyListening | SessionError::Cancelled => StatusCode::CONFLICT,
        SessionError::BackendStart(_) | SessionError::Recognition(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /recognition/start
/// Start a recognition session
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> impl IntoResponse {
    info!(
        language = req.language.as_deref(),
        partial = req.partial_results,
        "start requested"
    );

    let options = StartOptions {
        language: req.language,
        partial_results: req.partial_results,
        max_results: req.max_results,
        prompt: req.prompt,
    };

    match state.session.start(options).await {
        Ok(StartOutcome::Started) => {
            (StatusCode::OK, Json(StartResponse::Started { started: true })).into_response()
        }
        Ok(StartOutcome::Finished { matches }) => {
            (StatusCode::OK, Json(StartResponse::Finished { matches })).into_response()
        }
        Err(e) => (
            error_status(&e),
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// POST /recognition/stop
/// Stop the session cleanly; idempotent
pub async fn stop_session(State(state): State<AppState>) -> impl IntoResponse {
    let stopped = state.session.stop().await;
    (StatusCode::OK, Json(StopResponse { stopped }))
}

/// POST /recognition/cancel
/// Discard the session without waiting for results; idempotent
pub async fn cancel_session(State(state): State<AppState>) -> impl IntoResponse {
    let cancelled = state.session.cancel().await;
    (StatusCode::OK, Json(CancelResponse { cancelled }))
}

/// GET /recognition/available
/// Engine/model readiness
pub async fn available(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.available().await))
}

/// GET /recognition/status
/// Current session snapshot
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.snapshot().await))
}

/// GET /recognition/languages
/// Language codes with a loaded model
pub async fn supported_languages(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(LanguagesResponse {
            languages: state.session.supported_languages(),
        }),
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
