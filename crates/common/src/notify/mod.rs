//! Lifecycle notifications
//!
//! Workflow operations emit events for interested parties (admins on
//! submission, sellers on decisions). Delivery is best-effort: a failed
//! notification is logged and never fails the operation that produced it.

use crate::config::NotifyConfig;
use crate::errors::{AppError, Result};
use crate::metrics::record_notification;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

/// Event emitted by workflow operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A proposal entered review; admins should take a look
    SubmissionReceived {
        proposal_id: Uuid,
        creator_id: Uuid,
    },

    /// An admin decided on a submission; the seller should know
    ReviewDecided {
        proposal_id: Uuid,
        creator_id: Uuid,
        approved: bool,
        comment: Option<String>,
    },

    /// A proposal went live for buyers
    ProposalPublished {
        proposal_id: Uuid,
        creator_id: Uuid,
    },
}

impl LifecycleEvent {
    /// Stable event name, matching the wire tag
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::SubmissionReceived { .. } => "submission_received",
            LifecycleEvent::ReviewDecided { .. } => "review_decided",
            LifecycleEvent::ProposalPublished { .. } => "proposal_published",
        }
    }
}

/// Delivery channel for lifecycle events
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: LifecycleEvent) -> Result<()>;
}

/// Webhook delivery via HTTP POST
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to build notification client: {}", e),
            })?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, event: LifecycleEvent) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&event)
            .send()
            .await
            .map_err(|e| AppError::Notification {
                message: format!("Webhook delivery failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(AppError::Notification {
                message: format!("Webhook returned status {}", response.status()),
            });
        }
        Ok(())
    }
}

/// No-op notifier for deployments without a webhook and for tests
#[derive(Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _event: LifecycleEvent) -> Result<()> {
        Ok(())
    }
}

/// Build a notifier from configuration
pub fn notifier_from_config(config: &NotifyConfig) -> Result<Arc<dyn Notifier>> {
    match config.webhook_url {
        Some(ref url) => Ok(Arc::new(WebhookNotifier::new(
            url.clone(),
            config.timeout_secs,
        )?)),
        None => Ok(Arc::new(NullNotifier)),
    }
}

/// Fire-and-forget delivery; failures are logged, never propagated
pub fn spawn_notify(notifier: Arc<dyn Notifier>, event: LifecycleEvent) {
    tokio::spawn(async move {
        match notifier.notify(event.clone()).await {
            Ok(()) => record_notification(event.name(), true),
            Err(e) => {
                record_notification(event.name(), false);
                warn!(error = %e, ?event, "Lifecycle notification failed");
            }
        }
    });
}
