//! # Git Artifact Supplier
//!
//! Turns the tag stream of a git repository into published artifact versions.
//!
//! Tags are listed from the [`TagSource`] registered for the artifact's git type,
//! filtered and ordered by the artifact's [`TagVersionStrategy`](super::TagVersionStrategy),
//! and enriched with commit data. Version discovery records every tag it has seen in
//! the external [`TagCache`], so re-running it only reports tags pushed since.

use super::{GitRepoArtifact, GitType, GitVersion};
use crate::client::{GitCommit, GitTag, TagCache, TagSource};
use crate::delivery::{ArtifactMetadata, DeliveryConfig, GitMetadata, PublishedArtifact};
use crate::error::PluginError;
use crate::events::{EventPublisher, ResourceEvent};
use crate::observability::{metrics, OperationTracker};
use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, field::Empty, info, info_span, Instrument};

#[derive(Clone)]
pub struct GitArtifactSupplier {
    tag_sources: HashMap<GitType, Arc<dyn TagSource>>,
    cache: Arc<dyn TagCache>,
    events: Arc<dyn EventPublisher>,
    cache_prefix: String,
}

impl std::fmt::Debug for GitArtifactSupplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitArtifactSupplier")
            .field("git_types", &self.tag_sources.keys().collect::<Vec<_>>())
            .field("cache_prefix", &self.cache_prefix)
            .finish_non_exhaustive()
    }
}

fn published(artifact: &GitRepoArtifact, tag: &GitTag, commit: GitCommit) -> PublishedArtifact {
    PublishedArtifact {
        name: artifact.name.clone(),
        artifact_type: "git".to_string(),
        reference: artifact.reference.clone(),
        version: tag.name.clone(),
        metadata: ArtifactMetadata {
            git: Some(GitMetadata {
                commit: tag.commit_sha.clone(),
                repo_url: Some(commit.url),
                author: commit.author,
                date: commit.date,
                message: commit.message,
            }),
        },
    }
}

impl GitArtifactSupplier {
    pub fn new(
        cache: Arc<dyn TagCache>,
        events: Arc<dyn EventPublisher>,
        cache_prefix: impl Into<String>,
    ) -> Self {
        Self {
            tag_sources: HashMap::new(),
            cache,
            events,
            cache_prefix: cache_prefix.into(),
        }
    }

    /// Register the tag source serving repositories of `git_type`
    #[must_use]
    pub fn with_tag_source(mut self, git_type: GitType, source: Arc<dyn TagSource>) -> Self {
        self.tag_sources.insert(git_type, source);
        self
    }

    fn source_for(&self, artifact: &GitRepoArtifact) -> Result<&Arc<dyn TagSource>, PluginError> {
        self.tag_sources.get(&artifact.git_type).ok_or_else(|| {
            PluginError::misconfigured(format!(
                "no tag source registered for git type {} (artifact {})",
                artifact.git_type,
                artifact.identity()
            ))
        })
    }

    /// Valid tags of the artifact, newest first
    async fn versioned_tags(&self, artifact: &GitRepoArtifact) -> Result<Vec<GitTag>, PluginError> {
        let tags = self
            .source_for(artifact)?
            .list_tags(&artifact.project, &artifact.repo_name)
            .await?;
        let total = tags.len();
        let tags = artifact
            .tag_version_strategy
            .newest_first(tags, |tag| tag.name.as_str());
        debug!(
            "{} of {} tag(s) of {} are {} versions",
            tags.len(),
            total,
            artifact.identity(),
            artifact.tag_version_strategy
        );
        Ok(tags)
    }

    async fn with_commits(
        &self,
        artifact: &GitRepoArtifact,
        tags: &[GitTag],
    ) -> Result<Vec<PublishedArtifact>, PluginError> {
        let source = self.source_for(artifact)?;
        let commits = try_join_all(tags.iter().map(|tag| {
            source.get_commit(&artifact.project, &artifact.repo_name, &tag.commit_sha)
        }))
        .await?;
        Ok(tags
            .iter()
            .zip(commits)
            .map(|(tag, commit)| published(artifact, tag, commit))
            .collect())
    }

    /// Newest version of the artifact, if it has any
    pub async fn get_latest_artifact(
        &self,
        config: &DeliveryConfig,
        artifact: &GitRepoArtifact,
    ) -> Result<Option<PublishedArtifact>, PluginError> {
        Ok(self
            .get_latest_artifacts(config, artifact, 1)
            .await?
            .into_iter()
            .next())
    }

    /// Up to `limit` newest versions of the artifact, newest first
    pub async fn get_latest_artifacts(
        &self,
        config: &DeliveryConfig,
        artifact: &GitRepoArtifact,
        limit: usize,
    ) -> Result<Vec<PublishedArtifact>, PluginError> {
        debug!(
            "Fetching latest {} version(s) of {} for delivery config {}",
            limit,
            artifact.identity(),
            config.name
        );
        let mut tags = self.versioned_tags(artifact).await?;
        tags.truncate(limit);
        self.with_commits(artifact, &tags).await
    }

    /// Commit metadata behind `version`, or `None` when no such tag exists
    pub async fn get_artifact_metadata(
        &self,
        artifact: &GitRepoArtifact,
        version: &str,
    ) -> Result<Option<ArtifactMetadata>, PluginError> {
        let tags = self
            .source_for(artifact)?
            .list_tags(&artifact.project, &artifact.repo_name)
            .await?;
        let Some(tag) = tags.into_iter().find(|tag| tag.name == version) else {
            return Ok(None);
        };
        let mut published = self.with_commits(artifact, &[tag]).await?;
        Ok(published.pop().map(|artifact| artifact.metadata))
    }

    /// Record tags not seen before and announce each one exactly once
    pub async fn discover_versions(
        &self,
        artifact: &GitRepoArtifact,
    ) -> Result<Vec<GitVersion>, PluginError> {
        let span = info_span!(
            "git.discover",
            artifact = %artifact.identity(),
            operation.duration_ms = Empty,
            operation.success = Empty,
            error.message = Empty,
        );
        let tracker = OperationTracker::new(span.clone());

        async move {
            let result = self.record_new_versions(artifact).await;
            if let Ok(discovered) = &result {
                metrics::increment_git_versions_discovered(discovered.len());
            }
            tracker.finish(result)
        }
        .instrument(span)
        .await
    }

    async fn record_new_versions(
        &self,
        artifact: &GitRepoArtifact,
    ) -> Result<Vec<GitVersion>, PluginError> {
        let tags = self.versioned_tags(artifact).await?;
        let cached: HashSet<String> = self
            .cache
            .cached_versions(&artifact.cache_scan_pattern(&self.cache_prefix))
            .await?
            .into_iter()
            .collect();

        let mut discovered = Vec::new();
        for tag in tags {
            let mut version = artifact.version(tag.name);
            version.commit_id = tag.commit_sha;
            let key = version.cache_key(&self.cache_prefix);
            if cached.contains(&key) {
                continue;
            }
            self.cache.store(&key, &version.commit_id).await?;
            info!("Discovered version {} of {}", version.version, artifact.identity());
            self.events.publish(ResourceEvent::ArtifactVersionDiscovered {
                artifact: artifact.identity(),
                version: version.version.clone(),
            });
            discovered.push(version);
        }
        Ok(discovered)
    }
}
