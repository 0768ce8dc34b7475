pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod notify;
pub mod registry;
pub mod session;

pub use backend::{
    BackendCall, BackendEvent, BackendFactory, CallOp, CallProbe, RecognitionBackend,
    ScriptStep, ScriptedBackend, ScriptedFactory, SessionParams,
};
pub use config::{Config, RecognitionConfig};
pub use error::{ErrorCode, SessionError, SessionResult};
pub use http::{create_router, AppState};
pub use notify::{
    ChannelNotifier, EventNotifier, ListeningEvent, ListeningStatus, LogNotifier, NatsNotifier,
    Notification, TranscriptEvent,
};
pub use registry::{ModelHandle, ModelRegistry};
pub use session::{
    Availability, FragmentKind, MergeOutcome, PermissionGate, SessionController, SessionHandle,
    SessionSnapshot, SessionState, StartOptions, StartOutcome, TranscriptAccumulator,
};
