use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Docker artifacts a Kubernetes object's containers are bound to
///
/// Either a single `reference` or a `references` set. Each reference names a
/// delivery artifact and doubles as the placeholder image of the container it
/// binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContainerProvider {
    Single { reference: String },
    Multi { references: BTreeSet<String> },
}

impl ContainerProvider {
    /// All declared references, deduplicated and ordered
    #[must_use]
    pub fn references(&self) -> BTreeSet<String> {
        match self {
            ContainerProvider::Single { reference } => BTreeSet::from([reference.clone()]),
            ContainerProvider::Multi { references } => references.clone(),
        }
    }
}
