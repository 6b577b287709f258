//! # Collaborator Clients
//!
//! Contracts of the external systems the engine talks to, plus the HTTP and
//! Kubernetes implementations shipped with the plugin.
//!
//! - [`ManifestApi`]: current state of deployed objects
//! - [`ImageLookup`]: docker tag to digest resolution
//! - [`TaskLauncher`] / [`ExecutionLookup`]: deployment task submission and in-flight checks
//! - [`TagSource`] / [`TagCache`]: git tag listing and the cache of already-seen tags
//! - [`CredentialsProvider`]: git credentials per account
//!
//! Every call is an async boundary. Failures are [`ClientError`]s; a missing object is
//! [`ClientError::NotFound`] so callers can tell absence from breakage.

pub mod clouddriver;
pub mod cluster;
pub mod orca;

pub use clouddriver::ClouddriverClient;
pub use cluster::KubeManifestApi;
pub use orca::OrcaClient;

use crate::error::ClientError;
use crate::manifest::Manifest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Serves the deployed state of objects
#[async_trait]
pub trait ManifestApi: Send + Sync {
    /// Fetch `kind_qualified_name` (`"<kind> <name>"`) in `namespace` of `account`
    async fn get_manifest(
        &self,
        account: &str,
        namespace: &str,
        kind_qualified_name: &str,
    ) -> Result<Manifest, ClientError>;
}

/// An image known to a docker registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerImage {
    pub account: String,
    pub repository: String,
    pub tag: String,
    pub digest: String,
    /// Registry host, when the image does not live on the default registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
}

impl DockerImage {
    /// Digest-pinned image reference, e.g. `registry.io/org/app@sha256:...`
    #[must_use]
    pub fn pinned_reference(&self) -> String {
        match &self.registry {
            Some(registry) if !registry.is_empty() => {
                format!("{}/{}@{}", registry, self.repository, self.digest)
            }
            _ => format!("{}@{}", self.repository, self.digest),
        }
    }
}

/// Looks up images in docker registries
#[async_trait]
pub trait ImageLookup: Send + Sync {
    /// Whether [`ImageLookup::find_images`] honours the tag filter
    fn supports_filtered_search(&self) -> bool;

    async fn find_images(
        &self,
        account: &str,
        repository: &str,
        tag: &str,
    ) -> Result<Vec<DockerImage>, ClientError>;

    /// Every image of `repository`; the fallback when filtering is unsupported
    async fn list_images(
        &self,
        account: &str,
        repository: &str,
    ) -> Result<Vec<DockerImage>, ClientError>;
}

/// A submitted deployment task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
}

/// Submits deployment jobs to the orchestrator
#[async_trait]
pub trait TaskLauncher: Send + Sync {
    async fn submit_job(
        &self,
        resource_id: &str,
        application: &str,
        description: &str,
        correlation_id: &str,
        job: Value,
    ) -> Result<Task, ClientError>;
}

/// Finds executions tied to a correlation id
#[async_trait]
pub trait ExecutionLookup: Send + Sync {
    /// Ids of the executions still in flight for `correlation_id`
    async fn get_correlated_executions(
        &self,
        correlation_id: &str,
    ) -> Result<Vec<String>, ClientError>;
}

/// A git tag and the commit it points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitTag {
    pub name: String,
    pub commit_sha: String,
}

/// A git commit as reported by the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommit {
    /// Clone URL of the repository the commit belongs to
    pub url: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Lists tags and commits of a git hosting service
#[async_trait]
pub trait TagSource: Send + Sync {
    async fn list_tags(&self, project: &str, repo_slug: &str) -> Result<Vec<GitTag>, ClientError>;

    async fn get_commit(
        &self,
        project: &str,
        repo_slug: &str,
        sha: &str,
    ) -> Result<GitCommit, ClientError>;
}

/// External cache of git versions already seen
#[async_trait]
pub trait TagCache: Send + Sync {
    /// Keys matching a `<stem>:*` scan pattern
    async fn cached_versions(&self, pattern: &str) -> Result<Vec<String>, ClientError>;

    /// Record `key` with its commit `sha`
    async fn store(&self, key: &str, sha: &str) -> Result<(), ClientError>;
}

/// Username/token pair for a git account, wiped from memory on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct GitCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for GitCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Resolves git credentials by account name
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn credentials_for(&self, account: &str) -> Result<Option<GitCredentials>, ClientError>;
}

/// Map a non-success HTTP response to a [`ClientError`]
pub(crate) async fn error_for_response(
    response: reqwest::Response,
    what: &str,
) -> ClientError {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return ClientError::not_found(what);
    }
    let body = response.text().await.unwrap_or_default();
    ClientError::Status {
        status: status.as_u16(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinned_reference() {
        let mut image = DockerImage {
            account: "dockerhub".to_string(),
            repository: "org/app".to_string(),
            tag: "1.0.0".to_string(),
            digest: "sha256:abc".to_string(),
            registry: None,
        };
        assert_eq!(image.pinned_reference(), "org/app@sha256:abc");
        image.registry = Some("ghcr.io".to_string());
        assert_eq!(image.pinned_reference(), "ghcr.io/org/app@sha256:abc");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = GitCredentials {
            username: "bot".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("bot"));
        assert!(!rendered.contains("hunter2"));
    }
}
