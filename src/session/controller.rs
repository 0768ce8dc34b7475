use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::{self, WeakSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backend::{BackendEvent, BackendFactory, RecognitionBackend, SessionParams};
use crate::config::RecognitionConfig;
use crate::error::{SessionError, SessionResult};
use crate::notify::{EventNotifier, ListeningEvent, ListeningStatus, TranscriptEvent};
use crate::registry::{ModelHandle, ModelRegistry};

use super::silence::SilenceTimeoutManager;
use super::transcript::{FragmentKind, MergeOutcome, TranscriptAccumulator};

/// Where the controller is in the session lifecycle.
///
/// Transitional states live inside single command handlers (the serialized
/// critical section), so snapshots taken from outside only ever observe
/// `Idle` or `Listening`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Starting,
    Listening,
    Stopping,
    Cancelling,
    Error,
}

/// Options accepted by a start request.
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Requested language; normalized against the registry, falling back
    /// to the configured default
    pub language: Option<String>,
    /// Stream live hypotheses through the notifier instead of blocking
    /// the start call until the terminal result
    pub partial_results: bool,
    /// Override the configured alternatives bound
    pub max_results: Option<usize>,
    /// Prompt passed through to engines that support one
    pub prompt: Option<String>,
}

/// What a start call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Streaming session is live; transcripts arrive via the notifier
    Started,
    /// One-shot session finished with this transcript
    Finished { matches: Vec<String> },
}

/// Readiness as reported by `available()`.
#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub is_ready: bool,
    pub ready_languages: Vec<String>,
}

/// Point-in-time view of the controller for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub listening: bool,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub language: Option<String>,
}

/// Microphone (or equivalent) permission check, consulted synchronously
/// before every start.
pub trait PermissionGate: Send + Sync {
    fn granted(&self) -> bool;
}

impl<F> PermissionGate for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn granted(&self) -> bool {
        self()
    }
}

/// Messages funneled through the controller mailbox. Client requests and
/// backend callbacks alike; exactly one executes at a time.
pub(crate) enum Command {
    Available {
        reply: oneshot::Sender<Availability>,
    },
    Start {
        options: StartOptions,
        reply: oneshot::Sender<SessionResult<StartOutcome>>,
    },
    Stop {
        reply: oneshot::Sender<bool>,
    },
    Cancel {
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Backend {
        epoch: u64,
        event: BackendEvent,
    },
    SilenceElapsed {
        epoch: u64,
    },
}

/// Cloneable client side of the controller.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
    registry: Arc<ModelRegistry>,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Option<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(make(reply_tx)).await.is_err() {
            return None;
        }
        reply_rx.await.ok()
    }

    /// Side-effect-free readiness query. Never fails.
    pub async fn available(&self) -> Availability {
        self.request(|reply| Command::Available { reply })
            .await
            .unwrap_or(Availability {
                is_ready: false,
                ready_languages: Vec::new(),
            })
    }

    /// Start a session. With `partial_results` the call resolves as soon as
    /// the engine is listening; without it, the call blocks until the
    /// terminal result arrives.
    pub async fn start(&self, options: StartOptions) -> SessionResult<StartOutcome> {
        self.request(|reply| Command::Start { options, reply })
            .await
            .unwrap_or(Err(SessionError::NotReady))
    }

    /// Stop the session cleanly. Idempotent; returns whether the
    /// controller acknowledged.
    pub async fn stop(&self) -> bool {
        self.request(|reply| Command::Stop { reply })
            .await
            .unwrap_or(false)
    }

    /// Discard the session without waiting for results. Idempotent.
    pub async fn cancel(&self) -> bool {
        self.request(|reply| Command::Cancel { reply })
            .await
            .unwrap_or(false)
    }

    pub async fn is_listening(&self) -> bool {
        self.snapshot().await.listening
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.request(|reply| Command::Snapshot { reply })
            .await
            .unwrap_or(SessionSnapshot {
                state: SessionState::Idle,
                listening: false,
                session_id: None,
                started_at: None,
                language: None,
            })
    }

    /// Language codes with a loaded model.
    pub fn supported_languages(&self) -> Vec<String> {
        self.registry.available_languages()
    }
}

/// How to let go of a backend handle.
enum TeardownKind {
    /// Clean stop; the engine may flush a final result
    Stop,
    /// Discard; no further results expected
    Cancel,
}

/// The session state machine. One spawned task owns every piece of mutable
/// session state; everything else talks to it through the mailbox.
pub struct SessionController {
    config: RecognitionConfig,
    registry: Arc<ModelRegistry>,
    factory: Box<dyn BackendFactory>,
    notifier: Arc<dyn EventNotifier>,
    permissions: Arc<dyn PermissionGate>,

    rx: mpsc::Receiver<Command>,
    mailbox: WeakSender<Command>,

    state: SessionState,
    /// Monotonic session counter; events tagged with an older epoch come
    /// from a superseded backend and are dropped
    epoch: u64,
    backend: Option<Box<dyn RecognitionBackend>>,
    pump: Option<JoinHandle<()>>,
    transcript: TranscriptAccumulator,
    silence: SilenceTimeoutManager,
    active_model: Option<ModelHandle>,
    partial_results: bool,
    session_id: Option<String>,
    started_at: Option<DateTime<Utc>>,
    pending: Option<oneshot::Sender<SessionResult<StartOutcome>>>,
}

impl SessionController {
    /// Spawn the controller task and hand back its client handle.
    ///
    /// The controller only keeps a weak reference to its own mailbox, so
    /// dropping the last handle shuts the task down.
    pub fn spawn(
        config: RecognitionConfig,
        registry: Arc<ModelRegistry>,
        factory: Box<dyn BackendFactory>,
        notifier: Arc<dyn EventNotifier>,
        permissions: Arc<dyn PermissionGate>,
    ) -> SessionHandle {
        let (tx, rx) = mpsc::channel(64);
        let mailbox = tx.downgrade();

        let controller = Self {
            silence: SilenceTimeoutManager::new(config.silence_window(), mailbox.clone()),
            config,
            registry: Arc::clone(&registry),
            factory,
            notifier,
            permissions,
            rx,
            mailbox,
            state: SessionState::Idle,
            epoch: 0,
            backend: None,
            pump: None,
            transcript: TranscriptAccumulator::new(),
            active_model: None,
            partial_results: false,
            session_id: None,
            started_at: None,
            pending: None,
        };

        tokio::spawn(controller.run());

        SessionHandle { tx, registry }
    }

    async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            self.handle(command).await;
        }

        // Last handle dropped: let go of whatever is still live.
        self.silence.disarm();
        self.teardown_backend(TeardownKind::Cancel).await;
        debug!("session controller shut down");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Available { reply } => {
                let _ = reply.send(self.availability());
            }
            Command::Start { options, reply } => self.handle_start(options, reply).await,
            Command::Stop { reply } => {
                self.handle_stop().await;
                let _ = reply.send(true);
            }
            Command::Cancel { reply } => {
                self.handle_cancel().await;
                let _ = reply.send(true);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::Backend { epoch, event } => self.handle_backend_event(epoch, event).await,
            Command::SilenceElapsed { epoch } => self.handle_silence_elapsed(epoch).await,
        }
    }

    fn availability(&self) -> Availability {
        Availability {
            is_ready: self.registry.is_ready(),
            ready_languages: self.registry.available_languages(),
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            listening: self.state == SessionState::Listening,
            session_id: self.session_id.clone(),
            started_at: self.started_at,
            language: self.active_model.as_ref().map(|m| m.language.clone()),
        }
    }

    async fn handle_start(
        &mut self,
        options: StartOptions,
        reply: oneshot::Sender<SessionResult<StartOutcome>>,
    ) {
        // Precondition failures reject without touching session state.
        if !self.registry.is_ready() {
            let _ = reply.send(Err(SessionError::NotReady));
            return;
        }
        if !self.permissions.granted() {
            let _ = reply.send(Err(SessionError::PermissionDenied));
            return;
        }
        if self.state != SessionState::Idle {
            let _ = reply.send(Err(SessionError::AlreadyListening));
            return;
        }

        let language = self.registry.resolve_language(options.language.as_deref());
        let model = match self.registry.lookup(&language) {
            Some(model) => {
                if self.active_model.as_ref() != Some(&model) {
                    info!(language = %model.language, "switching recognition model");
                }
                self.active_model = Some(model.clone());
                model
            }
            None => match self.active_model.clone() {
                // Non-fatal: degrade to the model already loaded.
                Some(current) => {
                    warn!(
                        requested = %language,
                        active = %current.language,
                        "no model for requested language, keeping active model"
                    );
                    current
                }
                None => {
                    let _ = reply.send(Err(SessionError::NotReady));
                    return;
                }
            },
        };

        // A superseded handle must be fully gone before a new one exists.
        self.silence.disarm();
        self.teardown_backend(TeardownKind::Cancel).await;
        self.transcript.reset();

        let params = SessionParams {
            language: model.language.clone(),
            model,
            partial_results: options.partial_results,
            max_results: options.max_results.unwrap_or(self.config.max_results),
            prompt: options.prompt,
        };

        self.state = SessionState::Starting;
        self.partial_results = params.partial_results;

        let mut backend = match self.factory.create(&params) {
            Ok(backend) => backend,
            Err(e) => {
                let err = SessionError::BackendStart(format!("{e:#}"));
                self.fail(err.clone()).await;
                let _ = reply.send(Err(err));
                return;
            }
        };

        let session_id = Uuid::new_v4().to_string();
        info!(
            session = %session_id,
            backend = backend.name(),
            language = %params.language,
            partial = params.partial_results,
            "starting recognition session"
        );

        let events = match backend.start(params).await {
            Ok(events) => events,
            Err(e) => {
                let err = SessionError::BackendStart(format!("{e:#}"));
                self.fail(err.clone()).await;
                let _ = reply.send(Err(err));
                return;
            }
        };

        self.backend = Some(backend);
        self.epoch += 1;
        self.pump = Some(Self::spawn_pump(events, self.mailbox.clone(), self.epoch));

        self.session_id = Some(session_id);
        self.started_at = Some(Utc::now());
        self.state = SessionState::Listening;
        self.notify_status(ListeningStatus::Started).await;

        if self.partial_results {
            // Streaming mode: the transcript arrives via the notifier.
            let _ = reply.send(Ok(StartOutcome::Started));
        } else {
            // One-shot mode: park the reply until a terminal event.
            self.pending = Some(reply);
        }
    }

    /// Forward backend events into the mailbox, tagged with the session
    /// epoch so a superseded pump can never mutate a newer session.
    fn spawn_pump(
        mut events: mpsc::Receiver<BackendEvent>,
        mailbox: WeakSender<Command>,
        epoch: u64,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(tx) = mailbox.upgrade() else { break };
                if tx.send(Command::Backend { epoch, event }).await.is_err() {
                    break;
                }
            }
        })
    }

    async fn handle_stop(&mut self) {
        if self.state != SessionState::Listening {
            debug!("stop requested while idle");
            return;
        }
        info!("stopping recognition session");
        self.complete().await;
    }

    async fn handle_cancel(&mut self) {
        if self.state != SessionState::Listening {
            debug!("cancel requested while idle");
            return;
        }
        info!("cancelling recognition session");

        self.state = SessionState::Cancelling;
        self.silence.disarm();
        self.teardown_backend(TeardownKind::Cancel).await;

        if let Some(reply) = self.pending.take() {
            let _ = reply.send(Err(SessionError::Cancelled));
        }

        self.end_session().await;
    }

    async fn handle_backend_event(&mut self, epoch: u64, event: BackendEvent) {
        if epoch != self.epoch || self.state != SessionState::Listening {
            debug!(?event, "ignoring event from superseded backend");
            return;
        }

        match event {
            BackendEvent::Ready => {
                debug!("engine ready for speech");
                self.notify_status(ListeningStatus::Ready).await;
            }
            BackendEvent::SpeechStarted => {
                debug!("speech started");
                self.silence.disarm();
            }
            BackendEvent::SpeechEnded => {
                debug!("speech ended");
                self.silence.arm(self.epoch);
            }
            BackendEvent::Partial(fragment) => {
                if !fragment.is_empty() {
                    self.silence.disarm();
                }
                let outcome = self.transcript.apply(&fragment, FragmentKind::Partial);
                if outcome == MergeOutcome::Changed && self.partial_results {
                    self.notify_transcript().await;
                }
            }
            BackendEvent::Final(fragment) => {
                let outcome = self.transcript.apply(&fragment, FragmentKind::Final);
                if self.partial_results {
                    // Streaming: a final commits one utterance, the session
                    // keeps listening until stopped or the window elapses.
                    if outcome == MergeOutcome::Changed {
                        self.notify_transcript().await;
                    }
                    self.silence.arm(self.epoch);
                } else {
                    // One-shot: the terminal result.
                    self.complete().await;
                }
            }
            BackendEvent::Error(code) => {
                self.fail(SessionError::Recognition(code)).await;
            }
        }
    }

    async fn handle_silence_elapsed(&mut self, epoch: u64) {
        if epoch != self.epoch || self.state != SessionState::Listening {
            return;
        }
        info!(
            window_ms = self.config.silence_window_ms,
            "silence window elapsed, stopping session"
        );
        self.complete().await;
    }

    /// Clean terminal path shared by client stop, the silence timer and a
    /// one-shot final result.
    async fn complete(&mut self) {
        self.state = SessionState::Stopping;
        self.silence.disarm();
        self.teardown_backend(TeardownKind::Stop).await;

        if let Some(reply) = self.pending.take() {
            let matches = vec![self.transcript.observable()];
            let _ = reply.send(Ok(StartOutcome::Finished { matches }));
        }

        self.end_session().await;
    }

    /// Session-fatal error: back to idle, nothing half-alive.
    async fn fail(&mut self, err: SessionError) {
        error!("recognition session failed: {err}");

        self.state = SessionState::Error;
        self.silence.disarm();
        self.teardown_backend(TeardownKind::Cancel).await;

        if let Some(reply) = self.pending.take() {
            let _ = reply.send(Err(err.clone()));
        }

        self.notifier.listening_state(ListeningEvent::error(&err)).await;
        self.session_id = None;
        self.started_at = None;
        self.state = SessionState::Idle;
    }

    async fn end_session(&mut self) {
        self.notify_status(ListeningStatus::Stopped).await;
        self.session_id = None;
        self.started_at = None;
        self.state = SessionState::Idle;
    }

    /// Stop the pump first, then the handle itself; afterwards no part of
    /// the torn-down session can reach the mailbox with a live epoch.
    async fn teardown_backend(&mut self, kind: TeardownKind) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if let Some(mut backend) = self.backend.take() {
            let result = match kind {
                TeardownKind::Stop => backend.stop().await,
                TeardownKind::Cancel => backend.cancel().await,
            };
            if let Err(e) = result {
                warn!(backend = backend.name(), "backend teardown failed: {e:#}");
            }
        }
    }

    async fn notify_status(&self, status: ListeningStatus) {
        self.notifier
            .listening_state(ListeningEvent::status(status))
            .await;
    }

    async fn notify_transcript(&self) {
        self.notifier
            .partial_results(TranscriptEvent::single(self.transcript.observable()))
            .await;
    }
}
