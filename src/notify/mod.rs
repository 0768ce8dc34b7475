//! Delivery of session events to whoever is listening.
//!
//! The controller emits two message shapes: listening-state lifecycle
//! events and transcript updates. Where they go is an integration choice:
//! in-process channel, the log, or NATS.

mod messages;
mod nats;

pub use messages::{ListeningEvent, ListeningStatus, TranscriptEvent};
pub use nats::NatsNotifier;

use tokio::sync::mpsc;
use tracing::info;

/// Sink for session events.
///
/// Delivery is fire-and-forget from the controller's point of view;
/// implementations log their own failures.
#[async_trait::async_trait]
pub trait EventNotifier: Send + Sync {
    async fn listening_state(&self, event: ListeningEvent);
    async fn partial_results(&self, event: TranscriptEvent);
}

/// A session event with its channel, for in-process consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    ListeningState(ListeningEvent),
    PartialResults(TranscriptEvent),
}

/// Notifier that forwards events over a tokio channel, for embedding the
/// controller in another process (or a test) without any broker.
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl EventNotifier for ChannelNotifier {
    async fn listening_state(&self, event: ListeningEvent) {
        let _ = self.tx.send(Notification::ListeningState(event));
    }

    async fn partial_results(&self, event: TranscriptEvent) {
        let _ = self.tx.send(Notification::PartialResults(event));
    }
}

/// Notifier that just writes events to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl EventNotifier for LogNotifier {
    async fn listening_state(&self, event: ListeningEvent) {
        info!(status = ?event.status, error = event.error.as_deref(), "listening state");
    }

    async fn partial_results(&self, event: TranscriptEvent) {
        info!(matches = ?event.matches, "partial results");
    }
}
