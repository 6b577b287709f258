//! # GitOps Source Builder
//!
//! Builds the Flux `GitRepository` a consumer object is pointed at.

use crate::artifact::GitRepoArtifact;
use crate::constants::{GIT_REPOSITORY_API_VERSION, GIT_REPOSITORY_KIND};
use crate::manifest::Manifest;
use serde_json::{json, Map, Value};

/// Flux `GitRepository` for `artifact` cloned from `url`
///
/// - named `<artifact.name>-<environment>` when an environment is given, so one
///   repository can be instantiated per environment
/// - `spec.ref.tag` only when a version is given; otherwise `ref` is absent
/// - `spec.secretRef.name` only when the artifact names a secret
#[must_use]
pub fn generate_git_repo_manifest(
    artifact: &GitRepoArtifact,
    url: &str,
    version: Option<&str>,
    environment: Option<&str>,
) -> Manifest {
    let name = match environment {
        Some(environment) => format!("{}-{}", artifact.name, environment),
        None => artifact.name.clone(),
    };

    let mut metadata = Map::new();
    metadata.insert("name".to_string(), Value::String(name));
    metadata.insert(
        "namespace".to_string(),
        Value::String(artifact.namespace.clone()),
    );

    let mut spec = Map::new();
    spec.insert(
        "interval".to_string(),
        Value::String(artifact.interval.clone()),
    );
    spec.insert("url".to_string(), Value::String(url.to_string()));
    if let Some(version) = version {
        spec.insert("ref".to_string(), json!({ "tag": version }));
    }
    if let Some(secret) = &artifact.secret_ref {
        spec.insert("secretRef".to_string(), json!({ "name": secret }));
    }

    Manifest {
        api_version: Some(GIT_REPOSITORY_API_VERSION.to_string()),
        kind: Some(GIT_REPOSITORY_KIND.to_string()),
        metadata,
        spec: Some(spec),
        ..Manifest::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{GitType, TagVersionStrategy};

    fn artifact() -> GitRepoArtifact {
        GitRepoArtifact {
            name: "fnord-repo".to_string(),
            reference: "fnord".to_string(),
            project: "org".to_string(),
            repo_name: "fnord".to_string(),
            git_type: GitType::Github,
            namespace: "flux-system".to_string(),
            interval: "5m".to_string(),
            secret_ref: None,
            tag_version_strategy: TagVersionStrategy::SemverTag,
        }
    }

    #[test]
    fn test_name_is_suffixed_with_environment() {
        let manifest =
            generate_git_repo_manifest(&artifact(), "https://x", Some("1.0.0"), Some("prod"));
        assert_eq!(manifest.metadata["name"], json!("fnord-repo-prod"));
        assert_eq!(manifest.metadata["namespace"], json!("flux-system"));
    }

    #[test]
    fn test_name_without_environment() {
        let manifest = generate_git_repo_manifest(&artifact(), "https://x", Some("1.0.0"), None);
        assert_eq!(manifest.metadata["name"], json!("fnord-repo"));
    }

    #[test]
    fn test_version_sets_ref_tag() {
        let manifest = generate_git_repo_manifest(&artifact(), "https://x", Some("1.0.0"), None);
        let spec = manifest.spec.unwrap();
        assert_eq!(spec["ref"], json!({"tag": "1.0.0"}));
        assert_eq!(spec["url"], json!("https://x"));
        assert_eq!(spec["interval"], json!("5m"));
        assert_eq!(manifest.kind.as_deref(), Some("GitRepository"));
    }

    #[test]
    fn test_no_version_means_no_ref_key() {
        let manifest = generate_git_repo_manifest(&artifact(), "https://x", None, Some("prod"));
        assert!(!manifest.spec.unwrap().contains_key("ref"));
    }

    #[test]
    fn test_secret_ref_only_when_present() {
        let without = generate_git_repo_manifest(&artifact(), "https://x", None, None);
        assert!(!without.spec.unwrap().contains_key("secretRef"));

        let mut artifact = artifact();
        artifact.secret_ref = Some("git-creds".to_string());
        let with = generate_git_repo_manifest(&artifact, "https://x", None, None);
        assert_eq!(with.spec.unwrap()["secretRef"], json!({"name": "git-creds"}));
    }
}
