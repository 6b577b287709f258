use super::{Locations, ResourceSpec};
use crate::manifest::{Manifest, ManifestVariant};
use serde::{Deserialize, Deserializer, Serialize};

/// Git credentials materialised as a Kubernetes secret
///
/// The template is always the credential variant: its name comes from `kind` and
/// `data.account`, not from `metadata.name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsResourceSpec {
    pub locations: Locations,
    #[serde(deserialize_with = "credential_template")]
    template: Manifest,
}

fn credential_template<'de, D>(deserializer: D) -> Result<Manifest, D::Error>
where
    D: Deserializer<'de>,
{
    Manifest::deserialize(deserializer).map(|m| m.to_variant(ManifestVariant::Credential))
}

impl CredentialsResourceSpec {
    pub fn new(locations: Locations, template: Manifest) -> Self {
        Self {
            locations,
            template: template.to_variant(ManifestVariant::Credential),
        }
    }

    /// Git account whose credentials the secret carries
    #[must_use]
    pub fn git_account(&self) -> Option<&str> {
        self.template
            .data
            .as_ref()
            .and_then(|data| data.get("account"))
            .and_then(serde_json::Value::as_str)
    }
}

impl ResourceSpec for CredentialsResourceSpec {
    fn locations(&self) -> &Locations {
        &self.locations
    }

    fn template(&self) -> &Manifest {
        &self.template
    }
}
