//! # Resource Events
//!
//! Fire-and-forget notifications emitted while reconciling:
//! - health verdicts after fetching current state
//! - artifact deploying/deployed signals around an upsert
//! - newly discovered git versions

use crate::observability::metrics;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResourceEvent {
    #[serde(rename_all = "camelCase")]
    ResourceHealthy { resource_id: String },
    #[serde(rename_all = "camelCase")]
    ResourceUnhealthy { resource_id: String, reason: String },
    /// The cluster reports this version as the one deployed
    #[serde(rename_all = "camelCase")]
    ArtifactDeployed { resource_id: String, version: String },
    /// A deployment of this version is about to be submitted
    #[serde(rename_all = "camelCase")]
    ArtifactDeploying { resource_id: String, version: String },
    ArtifactVersionDiscovered { artifact: String, version: String },
}

impl ResourceEvent {
    /// Stable event name for metrics labels and logs
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceEvent::ResourceHealthy { .. } => "resource_healthy",
            ResourceEvent::ResourceUnhealthy { .. } => "resource_unhealthy",
            ResourceEvent::ArtifactDeployed { .. } => "artifact_deployed",
            ResourceEvent::ArtifactDeploying { .. } => "artifact_deploying",
            ResourceEvent::ArtifactVersionDiscovered { .. } => "artifact_version_discovered",
        }
    }

    /// Resource id, or artifact identity for discovery events
    #[must_use]
    pub fn subject(&self) -> &str {
        match self {
            ResourceEvent::ResourceHealthy { resource_id }
            | ResourceEvent::ResourceUnhealthy { resource_id, .. }
            | ResourceEvent::ArtifactDeployed { resource_id, .. }
            | ResourceEvent::ArtifactDeploying { resource_id, .. } => resource_id,
            ResourceEvent::ArtifactVersionDiscovered { artifact, .. } => artifact,
        }
    }
}

/// In-process event sink; publishing never fails and never blocks
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: ResourceEvent);
}

/// Forwards events to an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelEventPublisher {
    sender: mpsc::UnboundedSender<ResourceEvent>,
}

impl ChannelEventPublisher {
    /// Publisher plus the receiving end the host drains
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ResourceEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventPublisher for ChannelEventPublisher {
    fn publish(&self, event: ResourceEvent) {
        metrics::increment_events_published(event.as_str());
        if let Err(e) = self.sender.send(event) {
            debug!(
                "Event receiver dropped, discarding {} for {}",
                e.0.as_str(),
                e.0.subject()
            );
        }
    }
}

/// Writes each event as one structured log line
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventPublisher;

impl EventPublisher for LoggingEventPublisher {
    fn publish(&self, event: ResourceEvent) {
        metrics::increment_events_published(event.as_str());
        match &event {
            ResourceEvent::ResourceUnhealthy { resource_id, reason } => {
                info!(event = event.as_str(), resource.id = %resource_id, reason = %reason, "Resource event");
            }
            ResourceEvent::ArtifactDeployed { resource_id, version }
            | ResourceEvent::ArtifactDeploying { resource_id, version } => {
                info!(event = event.as_str(), resource.id = %resource_id, version = %version, "Resource event");
            }
            ResourceEvent::ArtifactVersionDiscovered { artifact, version } => {
                info!(event = event.as_str(), artifact = %artifact, version = %version, "Resource event");
            }
            ResourceEvent::ResourceHealthy { resource_id } => {
                info!(event = event.as_str(), resource.id = %resource_id, "Resource event");
            }
        }
    }
}
