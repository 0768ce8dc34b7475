//! HTTP API server for external control
//!
//! This module provides a REST API for driving the session controller:
//! - POST /recognition/start - Start a session
//! - POST /recognition/stop - Stop cleanly
//! - POST /recognition/cancel - Discard the session
//! - GET /recognition/available - Engine/model readiness
//! - GET /recognition/status - Session snapshot
//! - GET /recognition/languages - Loaded languages
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
