//! # Docker Image Resolver
//!
//! Pins the container images of a Kubernetes object to registry digests.
//!
//! Each container reference declared by the resource doubles as the placeholder
//! `image` of exactly one container. Resolution runs in two phases:
//! 1. structural checks over the template (no I/O): every reference must be used
//!    by exactly one container, otherwise `NotLinked` / `DuplicateReference`
//! 2. per reference, concurrently: approved version, then tag → digest lookup
//!
//! The template is never mutated; a rewritten copy is returned.

use crate::artifact::DeliveryArtifact;
use crate::client::{DockerImage, ImageLookup};
use crate::delivery::{DeliveryConfig, DeliveryConfigRepository, Environment};
use crate::error::PluginError;
use crate::manifest::{find_containers, map_containers};
use crate::observability::OperationTracker;
use crate::spec::{K8sResourceSpec, Resource, ResourceSpec};
use futures::future::try_join_all;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, field::Empty, info_span, Instrument};

#[derive(Clone)]
pub struct DockerImageResolver {
    repository: Arc<dyn DeliveryConfigRepository>,
    images: Arc<dyn ImageLookup>,
}

impl std::fmt::Debug for DockerImageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockerImageResolver").finish_non_exhaustive()
    }
}

fn image_of(container: &Value) -> Option<&str> {
    container.get("image").and_then(Value::as_str)
}

/// Every reference must be the image of exactly one container
fn check_links(
    spec: Option<&Map<String, Value>>,
    references: &BTreeSet<String>,
) -> Result<(), PluginError> {
    let containers = spec
        .and_then(find_containers)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for reference in references {
        let count = containers
            .iter()
            .filter(|container| image_of(container) == Some(reference.as_str()))
            .count();
        match count {
            0 => {
                return Err(PluginError::NotLinked {
                    reference: reference.clone(),
                })
            }
            1 => {}
            count => {
                return Err(PluginError::DuplicateReference {
                    reference: reference.clone(),
                    count,
                })
            }
        }
    }
    Ok(())
}

/// Containers with placeholder images swapped for pinned references
fn rewrite_images(containers: &[Value], pinned: &HashMap<String, String>) -> Vec<Value> {
    containers
        .iter()
        .map(|container| {
            let Some(image) = image_of(container).and_then(|image| pinned.get(image)) else {
                return container.clone();
            };
            let mut container = container.clone();
            if let Value::Object(fields) = &mut container {
                fields.insert("image".to_string(), Value::String(image.clone()));
            }
            container
        })
        .collect()
}

impl DockerImageResolver {
    pub fn new(
        repository: Arc<dyn DeliveryConfigRepository>,
        images: Arc<dyn ImageLookup>,
    ) -> Self {
        Self { repository, images }
    }

    /// Copy of `resource` whose linked container images are digest-pinned
    pub async fn resolve(
        &self,
        resource: &Resource<K8sResourceSpec>,
    ) -> Result<Resource<K8sResourceSpec>, PluginError> {
        let Some(provider) = &resource.spec.container else {
            return Ok(resource.clone());
        };
        let references = provider.references();
        check_links(resource.spec.template.spec.as_ref(), &references)?;

        let resource_id = resource.id();
        let span = info_span!(
            "docker.resolve",
            resource.id = %resource_id,
            references = references.len(),
            operation.duration_ms = Empty,
            operation.success = Empty,
            error.message = Empty,
        );
        let tracker = OperationTracker::new(span.clone());

        async move {
            let result = self.pin_images(resource, &resource_id, &references).await;
            tracker.finish(result)
        }
        .instrument(span)
        .await
    }

    async fn pin_images(
        &self,
        resource: &Resource<K8sResourceSpec>,
        resource_id: &str,
        references: &BTreeSet<String>,
    ) -> Result<Resource<K8sResourceSpec>, PluginError> {
        let (config, environment) = futures::try_join!(
            self.repository.delivery_config_for(resource_id),
            self.repository.environment_for(resource_id),
        )?;
        let config = config.ok_or_else(|| PluginError::ConfigNotFound {
            resource_id: resource_id.to_string(),
        })?;
        let environment = environment
            .or_else(|| config.environment_of(resource_id).cloned())
            .ok_or_else(|| PluginError::EnvironmentNotFound {
                resource_id: resource_id.to_string(),
            })?;

        let images = try_join_all(references.iter().map(|reference| {
            self.pin_reference(&config, &environment, resource.spec.account(), reference)
        }))
        .await?;
        let pinned: HashMap<String, String> = references
            .iter()
            .cloned()
            .zip(images.iter().map(DockerImage::pinned_reference))
            .collect();

        let mut resolved = resource.clone();
        resolved.spec.template.spec = resource
            .spec
            .template
            .spec
            .as_ref()
            .map(|spec| map_containers(spec, |containers| rewrite_images(containers, &pinned)));
        Ok(resolved)
    }

    async fn pin_reference(
        &self,
        config: &DeliveryConfig,
        environment: &Environment,
        default_account: &str,
        reference: &str,
    ) -> Result<DockerImage, PluginError> {
        let artifact =
            config
                .artifact_by_reference(reference)
                .ok_or_else(|| PluginError::NoMatchingArtifact {
                    reference: reference.to_string(),
                    delivery_config: config.name.clone(),
                })?;
        let DeliveryArtifact::Docker(docker) = artifact else {
            return Err(PluginError::misconfigured(format!(
                "container reference {reference} points at a {} artifact, expected docker",
                artifact.artifact_type()
            )));
        };

        let tag = self
            .repository
            .latest_version_approved_in(config, artifact, &environment.name)
            .await?
            .ok_or_else(|| PluginError::NoVersionAvailable {
                artifact: artifact.identity(),
                environment: environment.name.clone(),
            })?;

        let account = docker
            .registry_account
            .as_deref()
            .unwrap_or(default_account);
        let image = self.find_image(account, &docker.name, &tag).await?;
        debug!("Pinned {} to {}", reference, image.pinned_reference());
        Ok(image)
    }

    /// Exact (account, repository, tag) match, scanning all images when the
    /// registry cannot filter
    async fn find_image(
        &self,
        account: &str,
        repository: &str,
        tag: &str,
    ) -> Result<DockerImage, PluginError> {
        let candidates = if self.images.supports_filtered_search() {
            self.images.find_images(account, repository, tag).await?
        } else {
            self.images.list_images(account, repository).await?
        };
        candidates
            .into_iter()
            .find(|image| {
                image.account == account && image.repository == repository && image.tag == tag
            })
            .ok_or_else(|| PluginError::DockerImageNotFound {
                account: account.to_string(),
                repository: repository.to_string(),
                tag: tag.to_string(),
            })
    }
}
