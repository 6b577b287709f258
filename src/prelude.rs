//! Commonly used types, re-exported for hosts embedding the plugin.

pub use crate::artifact::{
    DeliveryArtifact, DockerArtifact, GitArtifactSupplier, GitRepoArtifact, GitType, GitVersion,
    TagVersionStrategy,
};
pub use crate::client::{
    ClouddriverClient, CredentialsProvider, ExecutionLookup, ImageLookup, KubeManifestApi,
    ManifestApi, OrcaClient, TagCache, TagSource, Task, TaskLauncher,
};
pub use crate::config::PluginConfig;
pub use crate::delivery::{
    ArtifactMetadata, DeliveryConfig, DeliveryConfigRepository, Environment, PublishedArtifact,
};
pub use crate::diff::ResourceDiff;
pub use crate::error::{ClientError, PluginError};
pub use crate::events::{EventPublisher, ResourceEvent};
pub use crate::handler::{
    actuate, ActuationOutcome, CredentialsResourceHandler, HandlerContext,
    HelmResourceHandler, K8sResourceHandler, KustomizeResourceHandler, ResourceHandler,
};
pub use crate::manifest::{cleanup, Manifest};
pub use crate::spec::{
    CredentialsResourceSpec, HelmResourceSpec, K8sResourceSpec, KustomizeResourceSpec,
    Resource, ResourceSpec,
};
