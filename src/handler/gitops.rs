//! # GitOps Handler
//!
//! Manages a Flux consumer (HelmRelease or Kustomization) together with the
//! `GitRepository` it is pointed at, bundled as one `List` composite.
//!
//! - desired: `[GitRepository at the approved tag, consumer]`, or `[consumer]`
//!   when the resource tracks no artifact
//! - current: both objects fetched concurrently, health evaluated, the deployed
//!   tag announced
//! - upsert: the tag about to be deployed is announced, then the composite is
//!   submitted as one task

use super::{generic, HandlerContext, ResourceHandler};
use crate::client::Task;
use crate::constants::{GIT_REPOSITORY_KIND, HELM_RESOURCE_KIND, KUSTOMIZE_RESOURCE_KIND};
use crate::diff::ResourceDiff;
use crate::error::PluginError;
use crate::events::ResourceEvent;
use crate::manifest::{cleanup, find, Manifest};
use crate::observability::OperationTracker;
use crate::resolver::{generate_git_repo_manifest, ArtifactVersionResolver, ResolvedArtifact};
use crate::spec::{GitOpsSpec, HelmResourceSpec, KustomizeResourceSpec, Resource, SourceRef};
use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, field::Empty, info_span, Instrument};

pub type HelmResourceHandler = GitOpsResourceHandler<HelmResourceSpec>;
pub type KustomizeResourceHandler = GitOpsResourceHandler<KustomizeResourceSpec>;

pub struct GitOpsResourceHandler<S> {
    kind: &'static str,
    context: HandlerContext,
    artifacts: ArtifactVersionResolver,
    _spec: PhantomData<fn() -> S>,
}

impl<S> std::fmt::Debug for GitOpsResourceHandler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitOpsResourceHandler")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<S> Clone for GitOpsResourceHandler<S> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            context: self.context.clone(),
            artifacts: self.artifacts.clone(),
            _spec: PhantomData,
        }
    }
}

impl<S> GitOpsResourceHandler<S> {
    fn with_kind(kind: &'static str, context: HandlerContext) -> Self {
        let artifacts = ArtifactVersionResolver::new(Arc::clone(&context.delivery));
        Self {
            kind,
            context,
            artifacts,
            _spec: PhantomData,
        }
    }
}

impl GitOpsResourceHandler<HelmResourceSpec> {
    pub fn new(context: HandlerContext) -> Self {
        Self::with_kind(HELM_RESOURCE_KIND, context)
    }
}

impl GitOpsResourceHandler<KustomizeResourceSpec> {
    pub fn new(context: HandlerContext) -> Self {
        Self::with_kind(KUSTOMIZE_RESOURCE_KIND, context)
    }
}

/// `spec.ref.tag` (or any nested `tag`) of every GitRepository in `items`
fn source_tags(items: &[Manifest]) -> impl Iterator<Item = &str> {
    items
        .iter()
        .filter(|item| item.is_kind(GIT_REPOSITORY_KIND))
        .filter_map(|item| item.spec.as_ref())
        .filter_map(|spec| find(spec, "tag"))
        .filter_map(Value::as_str)
}

/// Reason of the first unhealthy readiness condition across `items`
fn first_unhealthy(items: &[Manifest]) -> Option<String> {
    items.iter().find_map(|item| {
        let condition = item
            .status
            .as_ref()?
            .conditions
            .iter()
            .find(|condition| condition.is_unhealthy())?;
        Some(
            condition
                .message
                .clone()
                .or_else(|| condition.reason.clone())
                .unwrap_or_else(|| {
                    format!("{} is {}", condition.condition_type, condition.status)
                }),
        )
    })
}

impl<S: GitOpsSpec + Clone> GitOpsResourceHandler<S> {
    /// Consumer template pointed at the GitRepository generated for `resolved`
    fn consumer_manifest(resource: &Resource<S>, resolved: &ResolvedArtifact) -> Manifest {
        let source = SourceRef {
            kind: GIT_REPOSITORY_KIND.to_string(),
            name: format!(
                "{}-{}",
                resolved.artifact.name, resolved.environment.name
            ),
            namespace: resolved.artifact.namespace.clone(),
        };
        resource.spec.consumer_with_source(&source)
    }

    async fn compose(&self, resource: &Resource<S>) -> Result<Manifest, PluginError> {
        let correlation_id = self.correlation_id(resource);
        let Some(resolved) = self.artifacts.resolve_artifact_and_version(resource).await? else {
            return Ok(Manifest::list(
                &correlation_id,
                None,
                resource.spec.template().clone(),
            ));
        };

        let source = generate_git_repo_manifest(
            &resolved.artifact,
            &resolved.repo_url,
            Some(&resolved.version),
            Some(&resolved.environment.name),
        );
        let consumer = Self::consumer_manifest(resource, &resolved);
        debug!(
            "{} tracks {} at {}",
            resource.id(),
            resolved.artifact.identity(),
            resolved.version
        );
        Ok(Manifest::list(&correlation_id, Some(source), consumer))
    }

    fn publish_health(&self, resource_id: &str, items: &[Manifest]) {
        let event = match first_unhealthy(items) {
            Some(reason) => ResourceEvent::ResourceUnhealthy {
                resource_id: resource_id.to_string(),
                reason,
            },
            None => ResourceEvent::ResourceHealthy {
                resource_id: resource_id.to_string(),
            },
        };
        self.context.events.publish(event);
    }
}

#[async_trait]
impl<S: GitOpsSpec + Clone> ResourceHandler for GitOpsResourceHandler<S> {
    type Spec = S;

    fn supported_kind(&self) -> &'static str {
        self.kind
    }

    fn context(&self) -> &HandlerContext {
        &self.context
    }

    /// `<resource kind>:<resource id>`; also the name of the `List` composite
    fn correlation_id(&self, resource: &Resource<S>) -> String {
        format!("{}:{}", self.kind, resource.id())
    }

    async fn desired(&self, resource: &Resource<S>) -> Result<Manifest, PluginError> {
        let span = info_span!(
            "gitops.desired",
            resource.id = %resource.id(),
            operation.duration_ms = Empty,
            operation.success = Empty,
            error.message = Empty,
        );
        let tracker = OperationTracker::new(span.clone());
        async move { tracker.finish(self.compose(resource).await) }
            .instrument(span)
            .await
    }

    async fn current(&self, resource: &Resource<S>) -> Result<Option<Manifest>, PluginError> {
        let desired = self.desired(resource).await?;
        let account = resource.spec.account();
        let fetched = try_join_all(
            desired
                .list_items()
                .iter()
                .map(|item| generic::fetch_current(&self.context, account, item)),
        )
        .await?;
        let items: Vec<Manifest> = fetched.into_iter().flatten().collect();
        if items.is_empty() {
            return Ok(None);
        }

        let resource_id = resource.id();
        self.publish_health(&resource_id, &items);
        for version in source_tags(&items) {
            self.context.events.publish(ResourceEvent::ArtifactDeployed {
                resource_id: resource_id.clone(),
                version: version.to_string(),
            });
        }

        let composite = Manifest::list_of(&self.correlation_id(resource), items);
        Ok(Some(cleanup(&composite)))
    }

    async fn upsert(
        &self,
        resource: &Resource<S>,
        diff: &ResourceDiff,
    ) -> Result<Vec<Task>, PluginError> {
        let resource_id = resource.id();
        for version in source_tags(diff.desired.list_items()) {
            self.context.events.publish(ResourceEvent::ArtifactDeploying {
                resource_id: resource_id.clone(),
                version: version.to_string(),
            });
        }
        generic::upsert(
            &self.context,
            resource,
            diff,
            &self.correlation_id(resource),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> Manifest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_source_tags_only_from_git_repositories() {
        let items = vec![
            item(json!({"kind": "GitRepository", "metadata": {"name": "s"}, "spec": {"ref": {"tag": "1.2.3"}}})),
            item(json!({"kind": "Kustomization", "metadata": {"name": "c"}, "spec": {"tag": "nope"}})),
        ];
        assert_eq!(source_tags(&items).collect::<Vec<_>>(), vec!["1.2.3"]);
    }

    #[test]
    fn test_first_unhealthy_stops_at_first_hit() {
        let items = vec![
            item(json!({"kind": "GitRepository", "metadata": {"name": "s"},
                "status": {"conditions": [{"type": "Ready", "status": "True"}]}})),
            item(json!({"kind": "Kustomization", "metadata": {"name": "c"},
                "status": {"conditions": [{"type": "Ready", "status": "False", "message": "build failed"}]}})),
            item(json!({"kind": "Kustomization", "metadata": {"name": "d"},
                "status": {"conditions": [{"type": "Ready", "status": "False", "message": "later"}]}})),
        ];
        assert_eq!(first_unhealthy(&items).as_deref(), Some("build failed"));
    }

    #[test]
    fn test_missing_conditions_are_healthy() {
        let items = vec![item(json!({"kind": "Kustomization", "metadata": {"name": "c"}}))];
        assert!(first_unhealthy(&items).is_none());
    }
}
