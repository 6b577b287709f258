//! # Artifact Version Resolver
//!
//! Answers "which git artifact, at which version, from which repository" for a
//! resource that declares an `artifactSpec`.
//!
//! Failure policy:
//! - no owning delivery config: [`PluginError::ConfigNotFound`]
//! - reference matches no artifact: [`PluginError::NoMatchingArtifact`]
//! - nothing approved yet: [`PluginError::NoVersionAvailable`] (soft)
//! - metadata without a repository URL: [`PluginError::InvalidArtifact`]

use crate::artifact::{DeliveryArtifact, GitRepoArtifact};
use crate::delivery::{DeliveryConfig, DeliveryConfigRepository, Environment};
use crate::error::PluginError;
use crate::observability::OperationTracker;
use crate::spec::{Resource, ResourceSpec};
use std::sync::Arc;
use tracing::{debug, field::Empty, info_span, Instrument};

/// A git artifact pinned to the version approved for the resource's environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    /// Artifact with the resource's overrides applied
    pub artifact: GitRepoArtifact,
    pub version: String,
    pub repo_url: String,
    pub delivery_config: DeliveryConfig,
    pub environment: Environment,
}

#[derive(Clone)]
pub struct ArtifactVersionResolver {
    repository: Arc<dyn DeliveryConfigRepository>,
}

impl std::fmt::Debug for ArtifactVersionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactVersionResolver").finish_non_exhaustive()
    }
}

impl ArtifactVersionResolver {
    pub fn new(repository: Arc<dyn DeliveryConfigRepository>) -> Self {
        Self { repository }
    }

    /// Resolve the declared artifact; `None` when the resource declares none
    pub async fn resolve_artifact_and_version<S: ResourceSpec>(
        &self,
        resource: &Resource<S>,
    ) -> Result<Option<ResolvedArtifact>, PluginError> {
        let resource_id = resource.id();
        let span = info_span!(
            "artifact.resolve",
            resource.id = %resource_id,
            operation.duration_ms = Empty,
            operation.success = Empty,
            error.message = Empty,
        );
        let tracker = OperationTracker::new(span.clone());

        async move {
            let result = self.resolve(resource, &resource_id).await;
            tracker.finish(result)
        }
        .instrument(span)
        .await
    }

    async fn resolve<S: ResourceSpec>(
        &self,
        resource: &Resource<S>,
        resource_id: &str,
    ) -> Result<Option<ResolvedArtifact>, PluginError> {
        let (config, environment) = futures::try_join!(
            self.repository.delivery_config_for(resource_id),
            self.repository.environment_for(resource_id),
        )?;
        let config = config.ok_or_else(|| PluginError::ConfigNotFound {
            resource_id: resource_id.to_string(),
        })?;

        let Some(artifact_spec) = resource.spec.artifact_spec() else {
            debug!("{} declares no artifact, version is unmanaged", resource_id);
            return Ok(None);
        };

        let artifact = config
            .artifact_by_reference(&artifact_spec.reference)
            .ok_or_else(|| PluginError::NoMatchingArtifact {
                reference: artifact_spec.reference.clone(),
                delivery_config: config.name.clone(),
            })?;
        let DeliveryArtifact::Git(git) = artifact else {
            return Err(PluginError::misconfigured(format!(
                "artifact {} referenced by {} is a {} artifact, expected git",
                artifact_spec.reference,
                resource_id,
                artifact.artifact_type()
            )));
        };

        let environment = environment
            .or_else(|| config.environment_of(resource_id).cloned())
            .ok_or_else(|| PluginError::EnvironmentNotFound {
                resource_id: resource_id.to_string(),
            })?;

        let version = self
            .repository
            .latest_version_approved_in(&config, artifact, &environment.name)
            .await?
            .ok_or_else(|| PluginError::NoVersionAvailable {
                artifact: git.identity(),
                environment: environment.name.clone(),
            })?;

        let metadata = self
            .repository
            .get_artifact_version(artifact, &version, None)
            .await?;
        let repo_url = metadata
            .as_ref()
            .and_then(|metadata| metadata.repo_url())
            .map(str::to_string)
            .ok_or_else(|| PluginError::InvalidArtifact {
                artifact: git.identity(),
                version: version.clone(),
                reason: "artifact metadata has no repository url".to_string(),
            })?;

        debug!(
            "Resolved {} to {} version {} for environment {}",
            resource_id,
            git.identity(),
            version,
            environment.name
        );

        Ok(Some(ResolvedArtifact {
            artifact: git.with_overrides(artifact_spec),
            version,
            repo_url,
            delivery_config: config.clone(),
            environment,
        }))
    }
}
