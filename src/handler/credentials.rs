//! # Credentials Handler
//!
//! Git account credentials rendered into a `Secret` that Flux sources can reference.

use super::{HandlerContext, ResourceHandler};
use crate::constants::CREDENTIALS_RESOURCE_KIND;
use crate::error::PluginError;
use crate::manifest::{Manifest, ManifestVariant};
use crate::spec::{CredentialsResourceSpec, Resource, ResourceSpec};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde_json::{Map, Value};

/// Git credentials rendered into a Kubernetes secret Flux can clone with
#[derive(Debug, Clone)]
pub struct CredentialsResourceHandler {
    context: HandlerContext,
}

impl CredentialsResourceHandler {
    pub fn new(context: HandlerContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl ResourceHandler for CredentialsResourceHandler {
    type Spec = CredentialsResourceSpec;

    fn supported_kind(&self) -> &'static str {
        CREDENTIALS_RESOURCE_KIND
    }

    fn context(&self) -> &HandlerContext {
        &self.context
    }

    /// The credential template as a secret object carrying the account's
    /// base64-encoded username and password
    async fn desired(
        &self,
        resource: &Resource<CredentialsResourceSpec>,
    ) -> Result<Manifest, PluginError> {
        let template = resource.spec.template();
        let name = template.name()?;
        let account = resource.spec.git_account().ok_or_else(|| {
            PluginError::misconfigured(format!("credential {name} has no data.account"))
        })?;
        let credentials = self
            .context
            .credentials
            .credentials_for(account)
            .await?
            .ok_or_else(|| {
                PluginError::misconfigured(format!("no credentials known for git account {account}"))
            })?;

        let mut data = Map::new();
        data.insert(
            "username".to_string(),
            Value::String(general_purpose::STANDARD.encode(credentials.username.as_bytes())),
        );
        data.insert(
            "password".to_string(),
            Value::String(general_purpose::STANDARD.encode(credentials.password.as_bytes())),
        );

        let mut secret = template.to_variant(ManifestVariant::Object);
        secret.set_metadata("name", Value::String(name));
        secret.data = Some(data);
        Ok(secret)
    }
}
