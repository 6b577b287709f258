//! # Resolvers
//!
//! Turn a declared resource into concrete desired state:
//! - [`ArtifactVersionResolver`]: approved git artifact version and its repository URL
//! - [`generate_git_repo_manifest`]: the Flux source object for that version
//! - [`DockerImageResolver`]: digest-pinned container images

mod artifact;
mod docker;
mod gitops_source;

pub use artifact::{ArtifactVersionResolver, ResolvedArtifact};
pub use docker::DockerImageResolver;
pub use gitops_source::generate_git_repo_manifest;
