//! # Manifest Model
//!
//! Typed view of a Kubernetes-style manifest: `apiVersion`, `kind`, `metadata`,
//! `spec`, `data`, `status` and, for the synthetic `List` composite, `items`.
//!
//! A manifest is either a generic object or a credential. Both variants carry the
//! same field set; they differ only in how the object name is derived:
//! - objects use `metadata.name`
//! - credentials derive it from `kind` and `data.account`
//!
//! Converting between the two variants is a lossless structural copy.

pub mod cleanup;
pub mod search;

use crate::constants::{DEFAULT_NAMESPACE, LIST_API_VERSION, LIST_KIND};
use crate::error::PluginError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub use cleanup::cleanup;
pub use search::{find, find_containers, map_containers};

/// Which flavour of manifest this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ManifestVariant {
    /// A regular Kubernetes object (Deployment, HelmRelease, GitRepository, ...)
    #[default]
    Object,
    /// A credential whose payload is described by `data`
    Credential,
}

impl ManifestVariant {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestVariant::Object => "object",
            ManifestVariant::Credential => "credential",
        }
    }
}

impl fmt::Display for ManifestVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManifestVariant {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "object" => Ok(ManifestVariant::Object),
            "credential" => Ok(ManifestVariant::Credential),
            _ => Err(PluginError::UnsupportedManifestKind {
                from: "manifest".to_string(),
                target: s.to_string(),
            }),
        }
    }
}

/// One entry of `status.conditions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl Condition {
    /// Whether this condition reports a negative readiness verdict
    #[must_use]
    pub fn is_unhealthy(&self) -> bool {
        crate::constants::HEALTH_CONDITION_TYPES.contains(&self.condition_type.as_str())
            && self.status != "True"
    }
}

/// Server-populated status block
///
/// Only `conditions` is interpreted; everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ManifestStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A Kubernetes-style manifest, desired or observed
///
/// Top-level fields other than the ones named here (`rules`, `roleRef`,
/// `type`, `stringData`, ...) are carried verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(skip)]
    pub variant: ManifestVariant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ManifestStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Manifest>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    /// Build a `List` composite holding the optional source followed by the consumer
    #[must_use]
    pub fn list(correlation_id: &str, source: Option<Manifest>, consumer: Manifest) -> Self {
        Self::list_of(
            correlation_id,
            source.into_iter().chain(std::iter::once(consumer)).collect(),
        )
    }

    /// `List` composite over items that are already in source-then-consumer order
    #[must_use]
    pub fn list_of(correlation_id: &str, items: Vec<Manifest>) -> Self {
        let mut metadata = Map::new();
        metadata.insert("name".to_string(), Value::String(correlation_id.to_string()));
        Self {
            api_version: Some(LIST_API_VERSION.to_string()),
            kind: Some(LIST_KIND.to_string()),
            metadata,
            items: Some(items),
            ..Self::default()
        }
    }

    /// Declared namespace, or the default namespace when absent
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.metadata
            .get("namespace")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    /// Object name, derived according to the manifest variant
    pub fn name(&self) -> Result<String, PluginError> {
        match self.variant {
            ManifestVariant::Object => self
                .metadata
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    PluginError::misconfigured(format!(
                        "{} manifest has no metadata.name",
                        self.kind.as_deref().unwrap_or("untyped")
                    ))
                }),
            ManifestVariant::Credential => {
                let kind = self.kind.as_deref().ok_or_else(|| {
                    PluginError::misconfigured("credential manifest has no kind")
                })?;
                let account = self
                    .data
                    .as_ref()
                    .and_then(|data| data.get("account"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        PluginError::misconfigured("credential manifest has no data.account")
                    })?;
                Ok(format!("{}-{}", kind.to_lowercase(), account))
            }
        }
    }

    /// `"<lowercase kind> <name>"`, the identifier the manifest API expects
    ///
    /// Empty when `kind` is unset.
    pub fn kind_qualified_name(&self) -> Result<String, PluginError> {
        match &self.kind {
            None => Ok(String::new()),
            Some(kind) => Ok(format!("{} {}", kind.to_lowercase(), self.name()?)),
        }
    }

    /// Whether this manifest's kind matches `kind` exactly
    #[must_use]
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }

    /// Whether this is the synthetic source+consumer composite
    #[must_use]
    pub fn is_list(&self) -> bool {
        self.is_kind(LIST_KIND)
    }

    /// Items of a `List` composite; empty for any other manifest
    #[must_use]
    pub fn list_items(&self) -> &[Manifest] {
        self.items.as_deref().unwrap_or_default()
    }

    /// Copy this manifest as the other variant
    #[must_use]
    pub fn to_variant(&self, variant: ManifestVariant) -> Manifest {
        Manifest {
            variant,
            ..self.clone()
        }
    }

    /// Copy this manifest as the variant named by `target` ("object" or "credential")
    pub fn convert_to(&self, target: &str) -> Result<Manifest, PluginError> {
        match target.parse::<ManifestVariant>() {
            Ok(variant) => Ok(self.to_variant(variant)),
            Err(_) => Err(PluginError::UnsupportedManifestKind {
                from: self.variant.to_string(),
                target: target.to_string(),
            }),
        }
    }

    /// Set a top-level `metadata` entry
    pub fn set_metadata(&mut self, key: &str, value: Value) {
        self.metadata.insert(key.to_string(), value);
    }

    /// Render as a JSON value for diffing or submission
    pub fn to_value(&self) -> Result<Value, PluginError> {
        serde_json::to_value(self).map_err(|e| PluginError::Client(e.into()))
    }
}
