//! # Constants
//!
//! Shared constants used throughout the plugin.
//!
//! These values mirror what Kubernetes, Flux and the orchestrator expect on the
//! wire. Tunables that operators may want to change live in
//! [`crate::config::PluginConfig`] instead.

/// Namespace used when a manifest does not declare one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Annotation written by `kubectl apply` that must never take part in a diff
pub const LAST_APPLIED_CONFIG_ANNOTATION: &str =
    "kubectl.kubernetes.io/last-applied-configuration";

/// `metadata` fields the API server owns on every stored object
pub const SERVER_MANAGED_METADATA: [&str; 6] = [
    "resourceVersion",
    "uid",
    "creationTimestamp",
    "generation",
    "managedFields",
    "selfLink",
];

/// apiVersion of the synthetic composite that bundles a source and its consumer
pub const LIST_API_VERSION: &str = "v1";

/// Kind of the synthetic composite that bundles a source and its consumer
pub const LIST_KIND: &str = "List";

/// apiVersion of the generated Flux source object
pub const GIT_REPOSITORY_API_VERSION: &str = "source.toolkit.fluxcd.io/v1beta1";

/// Kind of the generated Flux source object
pub const GIT_REPOSITORY_KIND: &str = "GitRepository";

/// Namespace the Flux source object lands in when the artifact does not override it
pub const DEFAULT_ARTIFACT_NAMESPACE: &str = "flux-system";

/// Flux reconcile interval used when the artifact does not override it
pub const DEFAULT_ARTIFACT_INTERVAL: &str = "1m";

/// Cloud provider name the orchestrator's deploy stage expects
pub const CLOUD_PROVIDER: &str = "kubernetes";

/// Stage type submitted to the orchestrator for every upsert
pub const DEPLOY_MANIFEST_STAGE: &str = "deployManifest";

/// Default key prefix for the external tag cache
pub const DEFAULT_TAG_CACHE_PREFIX: &str = "keel";

/// Condition types that carry the readiness verdict of a Flux or workload object
pub const HEALTH_CONDITION_TYPES: [&str; 2] = ["Ready", "Available"];

/// Resource kind handled by the plain Kubernetes object handler
pub const K8S_RESOURCE_KIND: &str = "k8s/resource@v1";

/// Resource kind handled by the Flux HelmRelease handler
pub const HELM_RESOURCE_KIND: &str = "k8s/helm@v1";

/// Resource kind handled by the Flux Kustomization handler
pub const KUSTOMIZE_RESOURCE_KIND: &str = "k8s/kustomize@v1";

/// Resource kind handled by the git credentials handler
pub const CREDENTIALS_RESOURCE_KIND: &str = "k8s/credential@v1";

/// Default HTTP timeout for collaborator APIs (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
