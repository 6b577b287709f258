//! # Delivery Configs
//!
//! The pipeline definition resources belong to: artifacts, environments, and the
//! repository that answers which version is approved where.

use crate::artifact::DeliveryArtifact;
use crate::error::ClientError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named deployment stage and the resources placed in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub name: String,
    /// Ids of the resources deployed in this environment
    #[serde(default)]
    pub resources: BTreeSet<String>,
}

/// Declarative pipeline definition of one application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryConfig {
    pub name: String,
    pub application: String,
    #[serde(default)]
    pub artifacts: Vec<DeliveryArtifact>,
    #[serde(default)]
    pub environments: Vec<Environment>,
}

impl DeliveryConfig {
    /// Artifact whose reference equals `reference`
    #[must_use]
    pub fn artifact_by_reference(&self, reference: &str) -> Option<&DeliveryArtifact> {
        self.artifacts
            .iter()
            .find(|artifact| artifact.reference() == reference)
    }

    /// Environment the resource with `resource_id` is placed in
    #[must_use]
    pub fn environment_of(&self, resource_id: &str) -> Option<&Environment> {
        self.environments
            .iter()
            .find(|env| env.resources.contains(resource_id))
    }
}

/// Commit data behind a git artifact version
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitMetadata {
    pub commit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Extra data recorded for a published artifact version
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitMetadata>,
}

impl ArtifactMetadata {
    /// Repository URL, when present and non-empty
    #[must_use]
    pub fn repo_url(&self) -> Option<&str> {
        self.git
            .as_ref()
            .and_then(|git| git.repo_url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }
}

/// A version of an artifact as published by its supplier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedArtifact {
    pub name: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub reference: String,
    pub version: String,
    #[serde(default)]
    pub metadata: ArtifactMetadata,
}

/// Read access to delivery configs and artifact approvals
#[async_trait]
pub trait DeliveryConfigRepository: Send + Sync {
    /// Delivery config owning the resource, if any
    async fn delivery_config_for(
        &self,
        resource_id: &str,
    ) -> Result<Option<DeliveryConfig>, ClientError>;

    /// Environment the resource is placed in, if any
    async fn environment_for(&self, resource_id: &str) -> Result<Option<Environment>, ClientError>;

    /// Newest version of `artifact` approved for `environment`
    async fn latest_version_approved_in(
        &self,
        config: &DeliveryConfig,
        artifact: &DeliveryArtifact,
        environment: &str,
    ) -> Result<Option<String>, ClientError>;

    /// Recorded metadata of one artifact version, optionally filtered by status
    async fn get_artifact_version(
        &self,
        artifact: &DeliveryArtifact,
        version: &str,
        status: Option<&str>,
    ) -> Result<Option<ArtifactMetadata>, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> DeliveryConfig {
        serde_json::from_value(json!({
            "name": "fnord-manifest",
            "application": "fnord",
            "artifacts": [{
                "type": "docker",
                "name": "org/fnord",
                "reference": "main-ref"
            }],
            "environments": [
                {"name": "test", "resources": ["acct-default-deployment-fnord-test"]},
                {"name": "prod", "resources": ["acct-default-deployment-fnord"]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_artifact_lookup_by_reference() {
        let config = config();
        assert!(config.artifact_by_reference("main-ref").is_some());
        assert!(config.artifact_by_reference("other").is_none());
    }

    #[test]
    fn test_environment_lookup_by_resource_id() {
        let config = config();
        assert_eq!(
            config
                .environment_of("acct-default-deployment-fnord")
                .map(|env| env.name.as_str()),
            Some("prod")
        );
        assert!(config.environment_of("unknown").is_none());
    }

    #[test]
    fn test_blank_repo_url_is_absent() {
        let metadata = ArtifactMetadata {
            git: Some(GitMetadata {
                commit: "abc".to_string(),
                repo_url: Some("  ".to_string()),
                ..GitMetadata::default()
            }),
        };
        assert!(metadata.repo_url().is_none());
    }
}
