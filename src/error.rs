//! # Errors
//!
//! Typed failures surfaced by the resolution and reconciliation engine.
//!
//! Two layers:
//! - [`ClientError`]: a collaborator API call failed. The only classification the
//!   engine relies on is [`ClientError::is_not_found`], which turns "the object does
//!   not exist yet" into `None` on current-state lookups.
//! - [`PluginError`]: a resolution or reconciliation attempt failed. Variants are
//!   classified as soft (`is_transient`) or fatal for the attempt. The engine never
//!   retries; callers map soft failures to "try again next cycle".

use thiserror::Error;

/// Failure talking to an external collaborator (manifest API, orchestrator, registry)
#[derive(Debug, Error)]
pub enum ClientError {
    /// The requested object does not exist upstream (HTTP 404 or equivalent)
    #[error("not found: {what}")]
    NotFound { what: String },

    /// Upstream answered with a non-success status other than 404
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClientError {
    /// Build a `NotFound` error for the given object description
    pub fn not_found(what: impl Into<String>) -> Self {
        ClientError::NotFound { what: what.into() }
    }

    /// Whether this error means "the object does not exist" rather than a failure
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            ClientError::NotFound { .. } => true,
            ClientError::Status { status, .. } => *status == 404,
            ClientError::Kube(kube::Error::Api(response)) => response.code == 404,
            _ => false,
        }
    }
}

/// Failure of a single resolution or reconciliation attempt
#[derive(Debug, Error)]
pub enum PluginError {
    /// No delivery config owns the resource; a caller programming error
    #[error("no delivery config found for resource {resource_id}")]
    ConfigNotFound { resource_id: String },

    /// The delivery config does not place the resource in any environment
    #[error("no environment found for resource {resource_id}")]
    EnvironmentNotFound { resource_id: String },

    /// The declared artifact reference matches nothing in the delivery config
    #[error("no artifact with reference {reference} in delivery config {delivery_config}")]
    NoMatchingArtifact {
        reference: String,
        delivery_config: String,
    },

    /// Nothing has been approved for the environment yet
    #[error("no version of {artifact} is approved for environment {environment} yet")]
    NoVersionAvailable {
        artifact: String,
        environment: String,
    },

    /// Upstream artifact metadata is unusable
    #[error("artifact {artifact} version {version} is invalid: {reason}")]
    InvalidArtifact {
        artifact: String,
        version: String,
        reason: String,
    },

    /// A declared container reference is not used by any container in the manifest
    #[error("artifact reference {reference} is not linked to any container in the manifest")]
    NotLinked { reference: String },

    /// More than one container claims the same artifact reference
    #[error("artifact reference {reference} is claimed by {count} containers")]
    DuplicateReference { reference: String, count: usize },

    /// The registry has no image for the approved tag yet
    #[error("no docker image {repository}:{tag} found in account {account}")]
    DockerImageNotFound {
        account: String,
        repository: String,
        tag: String,
    },

    /// The declared object is internally inconsistent
    #[error("misconfigured object: {reason}")]
    MisconfiguredObject { reason: String },

    /// A manifest conversion was requested to a variant that does not exist
    #[error("cannot convert a {from} manifest to {target}")]
    UnsupportedManifestKind { from: String, target: String },

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl PluginError {
    pub fn misconfigured(reason: impl Into<String>) -> Self {
        PluginError::MisconfiguredObject {
            reason: reason.into(),
        }
    }

    /// Soft conditions: nothing to deploy yet. Callers defer to the next cycle.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PluginError::NoVersionAvailable { .. } | PluginError::DockerImageNotFound { .. }
        )
    }

    /// Stable reason string for metrics labels and structured logs
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginError::ConfigNotFound { .. } => "config_not_found",
            PluginError::EnvironmentNotFound { .. } => "environment_not_found",
            PluginError::NoMatchingArtifact { .. } => "no_matching_artifact",
            PluginError::NoVersionAvailable { .. } => "no_version_available",
            PluginError::InvalidArtifact { .. } => "invalid_artifact",
            PluginError::NotLinked { .. } => "not_linked",
            PluginError::DuplicateReference { .. } => "duplicate_reference",
            PluginError::DockerImageNotFound { .. } => "docker_image_not_found",
            PluginError::MisconfiguredObject { .. } => "misconfigured_object",
            PluginError::UnsupportedManifestKind { .. } => "unsupported_manifest_kind",
            PluginError::Client(_) => "client_error",
        }
    }
}
