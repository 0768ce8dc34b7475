//! Recognition session management
//!
//! This module provides the session state machine and its supporting
//! pieces:
//! - `SessionController` / `SessionHandle`: single-session orchestration,
//!   serialized through one actor mailbox
//! - `TranscriptAccumulator`: pure merging of partial/final fragments
//! - silence auto-stop policy for continuous-listening engines

mod controller;
mod silence;
mod transcript;

pub use controller::{
    Availability, PermissionGate, SessionController, SessionHandle, SessionSnapshot,
    SessionState, StartOptions, StartOutcome,
};
pub use transcript::{FragmentKind, MergeOutcome, TranscriptAccumulator};
