//! # Kubernetes Manifest API
//!
//! Reads deployed objects straight from the cluster the client is configured for.
//!
//! Only well-known kinds are resolvable: the Flux source and consumer kinds plus
//! the core workload kinds. The account argument is ignored; one client talks to
//! one cluster.

use super::ManifestApi;
use crate::constants::{GIT_REPOSITORY_API_VERSION, GIT_REPOSITORY_KIND};
use crate::error::ClientError;
use crate::manifest::Manifest;
use crate::observability::metrics;
use async_trait::async_trait;
use kube::{
    api::{Api, ApiResource},
    core::{DynamicObject, GroupVersionKind},
    Client,
};
use tracing::debug;

/// (group, version, kind) for a lowercase kind name
fn gvk_for(kind: &str) -> Option<GroupVersionKind> {
    let (group, version, kind) = match kind {
        "gitrepository" => {
            let (group, version) = GIT_REPOSITORY_API_VERSION
                .split_once('/')
                .unwrap_or(("", GIT_REPOSITORY_API_VERSION));
            (group, version, GIT_REPOSITORY_KIND)
        }
        "helmrepository" => ("source.toolkit.fluxcd.io", "v1beta2", "HelmRepository"),
        "kustomization" => ("kustomize.toolkit.fluxcd.io", "v1", "Kustomization"),
        "helmrelease" => ("helm.toolkit.fluxcd.io", "v2", "HelmRelease"),
        "deployment" => ("apps", "v1", "Deployment"),
        "statefulset" => ("apps", "v1", "StatefulSet"),
        "daemonset" => ("apps", "v1", "DaemonSet"),
        "replicaset" => ("apps", "v1", "ReplicaSet"),
        "job" => ("batch", "v1", "Job"),
        "cronjob" => ("batch", "v1", "CronJob"),
        "ingress" => ("networking.k8s.io", "v1", "Ingress"),
        "service" => ("", "v1", "Service"),
        "configmap" => ("", "v1", "ConfigMap"),
        "secret" => ("", "v1", "Secret"),
        "serviceaccount" => ("", "v1", "ServiceAccount"),
        _ => return None,
    };
    Some(GroupVersionKind {
        group: group.to_string(),
        version: version.to_string(),
        kind: kind.to_string(),
    })
}

/// [`ManifestApi`] backed by a kube client
#[derive(Clone)]
pub struct KubeManifestApi {
    client: Client,
}

impl std::fmt::Debug for KubeManifestApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeManifestApi").finish_non_exhaustive()
    }
}

impl KubeManifestApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client from the in-cluster config or the local kubeconfig
    pub async fn try_default() -> Result<Self, ClientError> {
        Ok(Self::new(Client::try_default().await?))
    }
}

#[async_trait]
impl ManifestApi for KubeManifestApi {
    async fn get_manifest(
        &self,
        _account: &str,
        namespace: &str,
        kind_qualified_name: &str,
    ) -> Result<Manifest, ClientError> {
        let (kind, name) = kind_qualified_name.split_once(' ').ok_or_else(|| {
            anyhow::anyhow!("Expected '<kind> <name>', got '{kind_qualified_name}'")
        })?;
        let gvk = gvk_for(kind)
            .ok_or_else(|| anyhow::anyhow!("Unsupported kind for cluster lookup: {kind}"))?;

        metrics::increment_manifest_fetch();
        let ar = ApiResource::from_gvk(&gvk);
        let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), namespace, &ar);

        let object = match api.get(name).await {
            Ok(object) => object,
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                debug!("{} not found in namespace {}", kind_qualified_name, namespace);
                metrics::increment_manifest_not_found();
                return Err(ClientError::not_found(kind_qualified_name));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_value(serde_json::to_value(object)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flux_kinds_resolve() {
        let gvk = gvk_for("gitrepository").unwrap();
        assert_eq!(gvk.group, "source.toolkit.fluxcd.io");
        assert_eq!(gvk.version, "v1beta1");
        assert_eq!(gvk.kind, "GitRepository");

        assert_eq!(gvk_for("helmrelease").unwrap().group, "helm.toolkit.fluxcd.io");
        assert_eq!(gvk_for("deployment").unwrap().group, "apps");
        assert_eq!(gvk_for("configmap").unwrap().group, "");
    }

    #[test]
    fn test_unknown_kind_does_not_resolve() {
        assert!(gvk_for("widget").is_none());
    }
}
