//! # Resource Specs
//!
//! Declared desired state of a managed resource plus its placement.
//!
//! Every spec in the family exposes a template manifest and an account; the
//! resource id is a pure function of account, namespace, kind and name. Two specs
//! that agree on those four values are the same resource.

mod container;
mod credentials;
mod gitops;
mod k8s;

pub use container::ContainerProvider;
pub use credentials::CredentialsResourceSpec;
pub use gitops::{GitOpsSpec, HelmResourceSpec, KustomizeResourceSpec, SourceRef};
pub use k8s::K8sResourceSpec;

use crate::error::PluginError;
use crate::manifest::Manifest;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Where a resource is deployed
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locations {
    /// Kubernetes account the manifest is applied with
    pub account: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub regions: BTreeSet<String>,
}

/// Reference from a resource to a delivery artifact, with per-resource overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSpec {
    #[serde(rename = "ref")]
    pub reference: String,
    /// Overrides the namespace of the generated source object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Overrides the Flux reconcile interval of the generated source object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

/// Common surface of every resource spec
pub trait ResourceSpec: Send + Sync + 'static {
    fn locations(&self) -> &Locations;

    /// The declared manifest this spec manages
    fn template(&self) -> &Manifest;

    /// Artifact the resource tracks, if any
    fn artifact_spec(&self) -> Option<&ArtifactSpec> {
        None
    }

    fn account(&self) -> &str {
        &self.locations().account
    }

    fn namespace(&self) -> &str {
        self.template().namespace()
    }

    fn kind(&self) -> &str {
        self.template().kind.as_deref().unwrap_or_default()
    }

    /// Template name; empty when the template cannot name itself
    fn name(&self) -> String {
        self.template().name().unwrap_or_default()
    }

    /// `account-namespace-kind-name`, lowercased
    fn id(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.account(),
            self.namespace(),
            self.kind(),
            self.name()
        )
        .to_lowercase()
    }

    fn display_name(&self) -> String {
        self.id()
    }
}

/// A managed resource: kind, free-form metadata and a typed spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<S> {
    /// Resource kind, e.g. `k8s/helm@v1`
    pub kind: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub spec: S,
}

impl<S: ResourceSpec> Resource<S> {
    pub fn new(kind: impl Into<String>, metadata: Map<String, Value>, spec: S) -> Self {
        Self {
            kind: kind.into(),
            metadata,
            spec,
        }
    }

    #[must_use]
    pub fn id(&self) -> String {
        self.spec.id()
    }

    /// Application that owns this resource; required for task submission
    pub fn application(&self) -> Result<&str, PluginError> {
        self.metadata
            .get("application")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PluginError::misconfigured(format!(
                    "resource {} has no application in its metadata",
                    self.id()
                ))
            })
    }
}
