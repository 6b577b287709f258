//! # Kubernetes Resource Plugin
//!
//! Managed Kubernetes and Flux GitOps resources for a continuous-delivery
//! orchestrator.
//!
//! A managed resource declares a manifest template, where it is deployed and,
//! optionally, which delivery artifact it tracks. Each reconciliation pass:
//!
//! 1. resolves the desired manifest (approved artifact version, pinned image digests,
//!    generated Flux source objects)
//! 2. fetches the live object and strips server-managed noise from both sides
//! 3. diffs them and, when they differ, submits one deploy task to the orchestrator
//!
//! The orchestrator, the manifest API, the docker registry, the tag source and the
//! delivery-config store are collaborators behind traits in [`client`] and
//! [`delivery`]; [`handler::HandlerContext`] wires them together.

pub mod artifact;
pub mod client;
pub mod config;
pub mod constants;
pub mod delivery;
pub mod diff;
pub mod error;
pub mod events;
pub mod handler;
pub mod manifest;
pub mod observability;
pub mod prelude;
pub mod resolver;
pub mod spec;
