use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session control
        .route("/recognition/start", post(handlers::start_session))
        .route("/recognition/stop", post(handlers::stop_session))
        .route("/recognition/cancel", post(handlers::cancel_session))
        // Queries
        .route("/recognition/available", get(handlers::available))
        .route("/recognition/status", get(handlers::status))
        .route("/recognition/languages", get(handlers::supported_languages))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
