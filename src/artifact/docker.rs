use super::TagVersionStrategy;
use serde::{Deserialize, Serialize};

/// Delivery artifact backed by the tags of a docker repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerArtifact {
    /// Repository, e.g. `org/app`
    pub name: String,
    /// Key containers use to refer to this artifact; also the placeholder image
    pub reference: String,
    #[serde(default)]
    pub tag_version_strategy: TagVersionStrategy,
    /// Registry account the image lookup runs against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_account: Option<String>,
}
