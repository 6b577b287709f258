//! # K8s Handler
//!
//! Plain Kubernetes objects, with docker-bound container images pinned before diffing.

use super::{HandlerContext, ResourceHandler};
use crate::constants::K8S_RESOURCE_KIND;
use crate::error::PluginError;
use crate::manifest::Manifest;
use crate::resolver::DockerImageResolver;
use crate::spec::{K8sResourceSpec, Resource};
use async_trait::async_trait;
use std::sync::Arc;

/// Plain Kubernetes objects; container images are pinned to approved digests
#[derive(Debug, Clone)]
pub struct K8sResourceHandler {
    context: HandlerContext,
    images: DockerImageResolver,
}

impl K8sResourceHandler {
    pub fn new(context: HandlerContext) -> Self {
        let images =
            DockerImageResolver::new(Arc::clone(&context.delivery), Arc::clone(&context.images));
        Self { context, images }
    }
}

#[async_trait]
impl ResourceHandler for K8sResourceHandler {
    type Spec = K8sResourceSpec;

    fn supported_kind(&self) -> &'static str {
        K8S_RESOURCE_KIND
    }

    fn context(&self) -> &HandlerContext {
        &self.context
    }

    async fn desired(&self, resource: &Resource<K8sResourceSpec>) -> Result<Manifest, PluginError> {
        Ok(self.images.resolve(resource).await?.spec.template)
    }
}
