use super::{ContainerProvider, Locations, ResourceSpec};
use crate::manifest::Manifest;
use serde::{Deserialize, Serialize};

/// A plain Kubernetes object, optionally bound to docker artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct K8sResourceSpec {
    pub locations: Locations,
    pub template: Manifest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerProvider>,
}

impl ResourceSpec for K8sResourceSpec {
    fn locations(&self) -> &Locations {
        &self.locations
    }

    fn template(&self) -> &Manifest {
        &self.template
    }
}
