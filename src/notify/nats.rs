use anyhow::{Context, Result};
use async_nats::Client;
use tracing::{info, warn};

use super::{EventNotifier, ListeningEvent, TranscriptEvent};

/// Notifier publishing session events to NATS as JSON.
///
/// Subjects are `{prefix}.listening-state` and `{prefix}.partial-results`.
pub struct NatsNotifier {
    client: Client,
    subject_prefix: String,
}

impl NatsNotifier {
    /// Connect to a NATS server.
    pub async fn connect(url: &str, subject_prefix: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            subject_prefix,
        })
    }

    async fn publish<T: serde::Serialize>(&self, channel: &str, message: &T) {
        let subject = format!("{}.{}", self.subject_prefix, channel);

        let payload = match serde_json::to_vec(message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode {} event: {}", channel, e);
                return;
            }
        };

        if let Err(e) = self.client.publish(subject.clone(), payload.into()).await {
            warn!("Failed to publish to {}: {}", subject, e);
        }
    }
}

#[async_trait::async_trait]
impl EventNotifier for NatsNotifier {
    async fn listening_state(&self, event: ListeningEvent) {
        self.publish("listening-state", &event).await;
    }

    async fn partial_results(&self, event: TranscriptEvent) {
        self.publish("partial-results", &event).await;
    }
}
