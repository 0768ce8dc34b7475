use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Errors a session request can fail with.
///
/// The first three variants are precondition failures: they are rejected
/// synchronously and leave the session untouched. `BackendStart` and
/// `Recognition` are session-fatal and force the controller back to idle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Recognition engine or models are not loaded yet
    #[error("Speech recognition not available")]
    NotReady,

    /// Microphone permission has not been granted
    #[error("Microphone permission required")]
    PermissionDenied,

    /// A session is already in flight
    #[error("Already listening")]
    AlreadyListening,

    /// The engine refused to start a session
    #[error("Failed to start recognition: {0}")]
    BackendStart(String),

    /// Runtime error reported by the engine while listening
    #[error("{}", .0.message())]
    Recognition(ErrorCode),

    /// The session was cancelled before a result arrived
    #[error("Recognition cancelled")]
    Cancelled,
}

impl SessionError {
    /// Engine error code, when this error carries one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            SessionError::Recognition(code) => Some(*code),
            _ => None,
        }
    }
}

/// Runtime error codes a recognition engine can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Audio,
    Client,
    InsufficientPermissions,
    Network,
    NetworkTimeout,
    NoMatch,
    RecognizerBusy,
    Server,
    SpeechTimeout,
    Unknown,
}

impl ErrorCode {
    /// Human-readable message for this code.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::Audio => "Audio recording error",
            ErrorCode::Client => "Client side error",
            ErrorCode::InsufficientPermissions => "Insufficient permissions",
            ErrorCode::Network => "Network error",
            ErrorCode::NetworkTimeout => "Network timeout",
            ErrorCode::NoMatch => "No match",
            ErrorCode::RecognizerBusy => "Recognition service busy",
            ErrorCode::Server => "Server error",
            ErrorCode::SpeechTimeout => "No speech input",
            ErrorCode::Unknown => "Didn't understand, please try again.",
        }
    }
}
