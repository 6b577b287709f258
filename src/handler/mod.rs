//! # Resource Handlers
//!
//! One handler per resource kind, all driving the same cycle:
//!
//! ```text
//! desired (resolve) → current (fetch) → diff → { no change | upsert }
//! ```
//!
//! [`ResourceHandler`] carries the generic behaviour as default methods:
//! - `desired` copies the template
//! - `current` fetches and cleans the template's object, mapping "not found" to `None`
//! - `upsert` submits one deploy-manifest task when the diff has changes
//! - `actuation_in_progress` asks the orchestrator for in-flight executions
//!
//! Specialisations override `desired`/`current`/`upsert` and call back into
//! [`generic`] for the shared steps. [`actuate`] runs the whole cycle once.

mod actuate;
mod credentials;
pub mod generic;
mod gitops;
mod k8s;

pub use actuate::{actuate, ActuationOutcome};
pub use credentials::CredentialsResourceHandler;
pub use gitops::{GitOpsResourceHandler, HelmResourceHandler, KustomizeResourceHandler};
pub use k8s::K8sResourceHandler;

use crate::client::{
    CredentialsProvider, ExecutionLookup, ImageLookup, ManifestApi, Task, TaskLauncher,
};
use crate::delivery::DeliveryConfigRepository;
use crate::diff::ResourceDiff;
use crate::error::PluginError;
use crate::events::EventPublisher;
use crate::manifest::{cleanup, Manifest};
use crate::spec::{Resource, ResourceSpec};
use async_trait::async_trait;
use std::sync::Arc;

/// Collaborators shared by every handler
#[derive(Clone)]
pub struct HandlerContext {
    pub manifests: Arc<dyn ManifestApi>,
    pub tasks: Arc<dyn TaskLauncher>,
    pub executions: Arc<dyn ExecutionLookup>,
    pub delivery: Arc<dyn DeliveryConfigRepository>,
    pub images: Arc<dyn ImageLookup>,
    pub credentials: Arc<dyn CredentialsProvider>,
    pub events: Arc<dyn EventPublisher>,
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext").finish_non_exhaustive()
    }
}

#[allow(
    clippy::missing_errors_doc,
    reason = "Every method fails with the PluginError of the step that failed"
)]
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    type Spec: ResourceSpec + Clone;

    /// Resource kind this handler manages, e.g. `k8s/helm@v1`
    fn supported_kind(&self) -> &'static str;

    fn context(&self) -> &HandlerContext;

    /// Ties submitted tasks back to the resource; the template name by default
    fn correlation_id(&self, resource: &Resource<Self::Spec>) -> String {
        resource.spec.name()
    }

    async fn desired(&self, resource: &Resource<Self::Spec>) -> Result<Manifest, PluginError> {
        Ok(resource.spec.template().clone())
    }

    async fn current(
        &self,
        resource: &Resource<Self::Spec>,
    ) -> Result<Option<Manifest>, PluginError> {
        let current = generic::fetch_current(
            self.context(),
            resource.spec.account(),
            resource.spec.template(),
        )
        .await?;
        Ok(current.as_ref().map(cleanup))
    }

    async fn upsert(
        &self,
        resource: &Resource<Self::Spec>,
        diff: &ResourceDiff,
    ) -> Result<Vec<Task>, PluginError> {
        let correlation_id = self.correlation_id(resource);
        generic::upsert(self.context(), resource, diff, &correlation_id).await
    }

    async fn actuation_in_progress(
        &self,
        resource: &Resource<Self::Spec>,
    ) -> Result<bool, PluginError> {
        let correlation_id = self.correlation_id(resource);
        generic::actuation_in_progress(self.context(), &correlation_id).await
    }
}
