//! Shared steps of the resolve → fetch → diff → upsert cycle.
//!
//! Every handler's default trait methods delegate here; specialised handlers call
//! these directly for the parts they do not override.

use super::HandlerContext;
use crate::client::Task;
use crate::constants::CLOUD_PROVIDER;
use crate::diff::ResourceDiff;
use crate::error::PluginError;
use crate::manifest::Manifest;
use crate::spec::{Resource, ResourceSpec};
use serde_json::{json, Value};
use tracing::{debug, info};

/// Live state of `manifest` as served, status included; `None` when it does not
/// exist yet
pub async fn fetch_current(
    context: &HandlerContext,
    account: &str,
    manifest: &Manifest,
) -> Result<Option<Manifest>, PluginError> {
    let kind_qualified_name = manifest.kind_qualified_name()?;
    match context
        .manifests
        .get_manifest(account, manifest.namespace(), &kind_qualified_name)
        .await
    {
        Ok(current) => Ok(Some(current)),
        Err(e) if e.is_not_found() => {
            debug!(
                "{} does not exist in {}/{} yet",
                kind_qualified_name,
                account,
                manifest.namespace()
            );
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Deploy-manifest job for `desired`
pub fn deploy_job<S: ResourceSpec>(
    resource: &Resource<S>,
    desired: &Manifest,
) -> Result<Value, PluginError> {
    Ok(json!({
        "moniker": {
            "app": resource.application()?,
            "location": resource.spec.namespace(),
        },
        "cloudProvider": CLOUD_PROVIDER,
        "credentials": resource.spec.account(),
        "manifests": [desired.to_value()?],
        "source": "text",
        "enableTraffic": "true",
    }))
}

/// Submit one deployment task when `diff` has changes, none otherwise
pub async fn upsert<S: ResourceSpec>(
    context: &HandlerContext,
    resource: &Resource<S>,
    diff: &ResourceDiff,
    correlation_id: &str,
) -> Result<Vec<Task>, PluginError> {
    if !diff.has_changes() {
        debug!("{} is up to date, nothing to deploy", resource.id());
        return Ok(Vec::new());
    }

    let application = resource.application()?;
    let job = deploy_job(resource, &diff.desired)?;
    let description = format!(
        "Deploy {} to {}",
        resource.spec.display_name(),
        resource.spec.account()
    );
    let task = context
        .tasks
        .submit_job(
            &resource.id(),
            application,
            &description,
            correlation_id,
            job,
        )
        .await?;
    info!(
        "Upserting {} ({} change(s)) as task {}",
        resource.id(),
        diff.entries().len(),
        task.id
    );
    Ok(vec![task])
}

/// Whether the orchestrator still runs anything for `correlation_id`
pub async fn actuation_in_progress(
    context: &HandlerContext,
    correlation_id: &str,
) -> Result<bool, PluginError> {
    let executions = context
        .executions
        .get_correlated_executions(correlation_id)
        .await?;
    if !executions.is_empty() {
        debug!(
            "{} execution(s) in flight for {}",
            executions.len(),
            correlation_id
        );
    }
    Ok(!executions.is_empty())
}
