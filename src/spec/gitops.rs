//! Flux consumers (HelmRelease, Kustomization) that may track a git artifact.

use super::{ArtifactSpec, Locations, ResourceSpec};
use crate::manifest::Manifest;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference from a Flux consumer to its source object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub kind: String,
    pub name: String,
    pub namespace: String,
}

/// A spec whose template consumes a Flux source object
pub trait GitOpsSpec: ResourceSpec {
    /// Keys leading from the consumer's `spec` to its `sourceRef`
    const SOURCE_REF_PATH: &'static [&'static str];

    /// Copy of the template with its `sourceRef` pointed at `source`
    fn consumer_with_source(&self, source: &SourceRef) -> Manifest {
        let mut consumer = self.template().clone();
        let mut spec = consumer.spec.take().unwrap_or_default();
        let reference = serde_json::to_value(source).unwrap_or(Value::Null);
        set_path(&mut spec, Self::SOURCE_REF_PATH, reference);
        consumer.spec = Some(spec);
        consumer
    }
}

fn set_path(map: &mut Map<String, Value>, path: &[&str], value: Value) {
    match path {
        [] => {}
        [last] => {
            map.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let entry = map
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(nested) = entry {
                set_path(nested, rest, value);
            }
        }
    }
}

/// A Flux HelmRelease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmResourceSpec {
    pub locations: Locations,
    pub template: Manifest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_spec: Option<ArtifactSpec>,
}

impl ResourceSpec for HelmResourceSpec {
    fn locations(&self) -> &Locations {
        &self.locations
    }

    fn template(&self) -> &Manifest {
        &self.template
    }

    fn artifact_spec(&self) -> Option<&ArtifactSpec> {
        self.artifact_spec.as_ref()
    }
}

impl GitOpsSpec for HelmResourceSpec {
    const SOURCE_REF_PATH: &'static [&'static str] = &["chart", "spec", "sourceRef"];
}

/// A Flux Kustomization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KustomizeResourceSpec {
    pub locations: Locations,
    pub template: Manifest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_spec: Option<ArtifactSpec>,
}

impl ResourceSpec for KustomizeResourceSpec {
    fn locations(&self) -> &Locations {
        &self.locations
    }

    fn template(&self) -> &Manifest {
        &self.template
    }

    fn artifact_spec(&self) -> Option<&ArtifactSpec> {
        self.artifact_spec.as_ref()
    }
}

impl GitOpsSpec for KustomizeResourceSpec {
    const SOURCE_REF_PATH: &'static [&'static str] = &["sourceRef"];
}
