//! # Converge Driver
//!
//! One pass of the reconciliation cycle for one resource. Soft conditions (nothing
//! approved yet, image not published yet) defer to the next pass; everything else
//! surfaces to the caller.

use super::ResourceHandler;
use crate::client::Task;
use crate::diff::ResourceDiff;
use crate::error::PluginError;
use crate::manifest::cleanup;
use crate::observability::metrics;
use crate::spec::Resource;
use std::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuationOutcome {
    /// Current state already matches desired state
    NoChange,
    Upserted(Vec<Task>),
    /// A previous deployment for this resource is still running
    InProgress,
    /// Nothing to deploy yet; retry on the next pass
    Deferred(String),
}

/// Resolve, fetch, diff and, when needed, upsert `resource`
pub async fn actuate<H: ResourceHandler>(
    handler: &H,
    resource: &Resource<H::Spec>,
) -> Result<ActuationOutcome, PluginError> {
    let start = Instant::now();
    let resource_id = resource.id();
    metrics::increment_resolutions(handler.supported_kind());

    let result = converge(handler, resource, &resource_id).await;
    metrics::observe_resolution_duration(start.elapsed().as_secs_f64());

    match result {
        Ok(outcome) => Ok(outcome),
        Err(e) if e.is_transient() => {
            warn!("Deferring {}: {}", resource_id, e);
            metrics::increment_resolution_errors(e.as_str());
            Ok(ActuationOutcome::Deferred(e.to_string()))
        }
        Err(e) => {
            error!("Failed to actuate {}: {}", resource_id, e);
            metrics::increment_resolution_errors(e.as_str());
            Err(e)
        }
    }
}

async fn converge<H: ResourceHandler>(
    handler: &H,
    resource: &Resource<H::Spec>,
    resource_id: &str,
) -> Result<ActuationOutcome, PluginError> {
    if handler.actuation_in_progress(resource).await? {
        info!("Actuation in progress for {}, skipping", resource_id);
        return Ok(ActuationOutcome::InProgress);
    }

    let desired = handler.desired(resource).await?;
    let current = handler.current(resource).await?;
    let diff = ResourceDiff::new(cleanup(&desired), current.as_ref().map(cleanup))?;
    if !diff.has_changes() {
        debug!("{} matches its desired state", resource_id);
        return Ok(ActuationOutcome::NoChange);
    }

    for entry in diff.entries() {
        debug!("{}: {}", resource_id, entry);
    }
    let tasks = handler.upsert(resource, &diff).await?;
    Ok(ActuationOutcome::Upserted(tasks))
}
