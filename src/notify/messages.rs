use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, SessionError};

/// Lifecycle status carried by a listening-state event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListeningStatus {
    Ready,
    Started,
    Stopped,
    Error,
}

/// Listening-state event delivered to whoever is observing the session.
///
/// Every session emits at most one `started`, eventually followed by
/// exactly one terminal status (`stopped` or `error`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListeningEvent {
    pub status: ListeningStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl ListeningEvent {
    pub fn status(status: ListeningStatus) -> Self {
        Self {
            status,
            error: None,
            code: None,
        }
    }

    pub fn error(err: &SessionError) -> Self {
        Self {
            status: ListeningStatus::Error,
            error: Some(err.to_string()),
            code: err.code(),
        }
    }
}

/// Transcript event: the full observable transcript at time of emission,
/// as a single-element list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    pub matches: Vec<String>,
}

impl TranscriptEvent {
    pub fn single(text: String) -> Self {
        Self {
            matches: vec![text],
        }
    }
}
