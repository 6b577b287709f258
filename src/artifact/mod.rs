//! # Delivery Artifacts
//!
//! Artifacts a delivery config tracks, how their tags become ordered versions,
//! and the supplier that reads git tag streams.

mod docker;
mod git;
mod strategy;
pub mod supplier;

pub use docker::DockerArtifact;
pub use git::{GitRepoArtifact, GitType, GitVersion};
pub use strategy::{TagKey, TagVersionStrategy};
pub use supplier::GitArtifactSupplier;

use serde::{Deserialize, Serialize};

/// An artifact declared in a delivery config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeliveryArtifact {
    Git(GitRepoArtifact),
    Docker(DockerArtifact),
}

impl DeliveryArtifact {
    #[must_use]
    pub fn reference(&self) -> &str {
        match self {
            DeliveryArtifact::Git(git) => &git.reference,
            DeliveryArtifact::Docker(docker) => &docker.reference,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            DeliveryArtifact::Git(git) => &git.name,
            DeliveryArtifact::Docker(docker) => &docker.name,
        }
    }

    #[must_use]
    pub fn artifact_type(&self) -> &'static str {
        match self {
            DeliveryArtifact::Git(_) => "git",
            DeliveryArtifact::Docker(_) => "docker",
        }
    }

    #[must_use]
    pub fn tag_version_strategy(&self) -> TagVersionStrategy {
        match self {
            DeliveryArtifact::Git(git) => git.tag_version_strategy,
            DeliveryArtifact::Docker(docker) => docker.tag_version_strategy,
        }
    }

    /// Log-friendly identity of the artifact
    #[must_use]
    pub fn identity(&self) -> String {
        match self {
            DeliveryArtifact::Git(git) => git.identity(),
            DeliveryArtifact::Docker(docker) => format!("docker-{}", docker.name),
        }
    }
}
