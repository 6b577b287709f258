//! # Git Artifacts
//!
//! A git repository tracked by its tag stream, and a concrete tagged version of it.

use super::TagVersionStrategy;
use crate::constants::{DEFAULT_ARTIFACT_INTERVAL, DEFAULT_ARTIFACT_NAMESPACE};
use crate::spec::ArtifactSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Git hosting service a repository lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitType {
    Github,
    Gitlab,
    Bitbucket,
}

impl GitType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            GitType::Github => "github",
            GitType::Gitlab => "gitlab",
            GitType::Bitbucket => "bitbucket",
        }
    }
}

impl fmt::Display for GitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_namespace() -> String {
    DEFAULT_ARTIFACT_NAMESPACE.to_string()
}

fn default_interval() -> String {
    DEFAULT_ARTIFACT_INTERVAL.to_string()
}

/// Delivery artifact backed by the tags of a git repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRepoArtifact {
    /// Name of the generated Flux source object
    pub name: String,
    /// Key resources use to refer to this artifact
    pub reference: String,
    pub project: String,
    pub repo_name: String,
    pub git_type: GitType,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_interval")]
    pub interval: String,
    /// Secret holding the credentials Flux clones with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<String>,
    #[serde(default)]
    pub tag_version_strategy: TagVersionStrategy,
}

impl GitRepoArtifact {
    /// `git-<gitType>-<project>-<repoName>`; names the tag stream
    #[must_use]
    pub fn identity(&self) -> String {
        format!("git-{}-{}-{}", self.git_type, self.project, self.repo_name)
    }

    /// Copy with the per-resource namespace and interval overrides applied
    #[must_use]
    pub fn with_overrides(&self, overrides: &ArtifactSpec) -> Self {
        Self {
            namespace: overrides
                .namespace
                .clone()
                .unwrap_or_else(|| self.namespace.clone()),
            interval: overrides
                .interval
                .clone()
                .unwrap_or_else(|| self.interval.clone()),
            ..self.clone()
        }
    }

    /// Cache key prefix shared by every version of this artifact
    fn cache_stem(&self, prefix: &str) -> String {
        format!(
            "{prefix}:git:{}:{}:{}",
            self.git_type, self.project, self.repo_name
        )
    }

    /// Pattern that enumerates every cached version of this artifact
    #[must_use]
    pub fn cache_scan_pattern(&self, prefix: &str) -> String {
        format!("{}:*", self.cache_stem(prefix))
    }

    /// Version named `version` of this artifact, with no commit data yet
    #[must_use]
    pub fn version(&self, version: impl Into<String>) -> GitVersion {
        GitVersion {
            git_type: self.git_type,
            project: self.project.clone(),
            repo_name: self.repo_name.clone(),
            version: version.into(),
            commit_id: String::new(),
            repo_url: None,
            author: None,
            date: None,
            message: None,
        }
    }
}

/// A concrete tag of a git artifact
///
/// Identity is the cache natural key (type, project, repo, version); commit data
/// does not take part in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitVersion {
    pub git_type: GitType,
    pub project: String,
    pub repo_name: String,
    pub version: String,
    pub commit_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GitVersion {
    /// `<prefix>:git:<type>:<project>:<repo>:<version>`
    #[must_use]
    pub fn cache_key(&self, prefix: &str) -> String {
        format!(
            "{prefix}:git:{}:{}:{}:{}",
            self.git_type, self.project, self.repo_name, self.version
        )
    }

    fn natural_key(&self) -> (GitType, &str, &str, &str) {
        (
            self.git_type,
            &self.project,
            &self.repo_name,
            &self.version,
        )
    }
}

impl PartialEq for GitVersion {
    fn eq(&self, other: &Self) -> bool {
        self.natural_key() == other.natural_key()
    }
}

impl Eq for GitVersion {}

impl Hash for GitVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.natural_key().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn artifact() -> GitRepoArtifact {
        serde_json::from_value(json!({
            "name": "app-repo",
            "reference": "app",
            "project": "org",
            "repoName": "app",
            "gitType": "github"
        }))
        .unwrap()
    }

    #[test]
    fn test_defaults_applied_on_deserialize() {
        let artifact = artifact();
        assert_eq!(artifact.namespace, "flux-system");
        assert_eq!(artifact.interval, "1m");
        assert_eq!(artifact.tag_version_strategy, TagVersionStrategy::SemverTag);
        assert!(artifact.secret_ref.is_none());
    }

    #[test]
    fn test_identity() {
        assert_eq!(artifact().identity(), "git-github-org-app");
    }

    #[test]
    fn test_overrides_do_not_touch_original() {
        let original = artifact();
        let overridden = original.with_overrides(&ArtifactSpec {
            reference: "app".to_string(),
            namespace: Some("apps".to_string()),
            interval: None,
        });
        assert_eq!(overridden.namespace, "apps");
        assert_eq!(overridden.interval, "1m");
        assert_eq!(original.namespace, "flux-system");
    }

    #[test]
    fn test_cache_key_and_scan_pattern() {
        let artifact = artifact();
        assert_eq!(
            artifact.version("1.2.3").cache_key("keel"),
            "keel:git:github:org:app:1.2.3"
        );
        assert_eq!(artifact.cache_scan_pattern("keel"), "keel:git:github:org:app:*");
    }

    #[test]
    fn test_version_equality_ignores_commit_data() {
        let artifact = artifact();
        let mut a = artifact.version("1.2.3");
        a.commit_id = "abc".to_string();
        let mut b = artifact.version("1.2.3");
        b.commit_id = "def".to_string();
        b.author = Some("someone".to_string());
        assert_eq!(a, b);

        let set: HashSet<GitVersion> = [a, b, artifact.version("1.2.4")].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
