mod scripted;

pub use scripted::{BackendCall, CallOp, CallProbe, ScriptStep, ScriptedBackend, ScriptedFactory};

use anyhow::Result;
use tokio::sync::mpsc;

use crate::error::ErrorCode;
use crate::registry::ModelHandle;

/// Event a recognition engine reports while a session is live.
///
/// One-shot engines emit a single `Final` (or `Error`) per start and no
/// `Partial` unless asked for; streaming engines emit an unbounded sequence
/// of `Partial`/`Final` pairs until stopped. The controller handles both
/// through the same channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// Engine is ready for speech input
    Ready,
    /// Speech detected on the input
    SpeechStarted,
    /// Input went quiet
    SpeechEnded,
    /// Live hypothesis for the current utterance; empty marks a pause
    Partial(String),
    /// Finalized text for an utterance
    Final(String),
    /// Runtime failure; terminal for the session
    Error(ErrorCode),
}

/// Everything an engine needs to start one session.
#[derive(Debug, Clone)]
pub struct SessionParams {
    /// Resolved language code
    pub language: String,
    /// Model the session is bound to
    pub model: ModelHandle,
    /// Whether live hypotheses should be produced
    pub partial_results: bool,
    /// Upper bound on alternatives the engine should consider
    pub max_results: usize,
    /// Optional prompt shown/spoken by engines that support one
    pub prompt: Option<String>,
}

/// Recognition engine adapter
///
/// Implemented once per underlying engine. `start` returns the channel on
/// which this handle delivers its events, in production order; the channel
/// closes when the engine is done. A handle is single-use: one start, then
/// stop or cancel.
#[async_trait::async_trait]
pub trait RecognitionBackend: Send + Sync {
    /// Begin recognizing with the given parameters.
    async fn start(&mut self, params: SessionParams) -> Result<mpsc::Receiver<BackendEvent>>;

    /// Stop cleanly; the engine may still flush a final result.
    async fn stop(&mut self) -> Result<()>;

    /// Discard the in-flight utterance; no further results expected.
    async fn cancel(&mut self) -> Result<()>;

    /// Engine name for logging
    fn name(&self) -> &str;
}

/// Constructs a fresh backend handle for each session.
///
/// The controller never reuses a handle across sessions; whichever engine
/// is installed here gets a `create` call per start.
pub trait BackendFactory: Send + Sync {
    fn create(&self, params: &SessionParams) -> Result<Box<dyn RecognitionBackend>>;
}
