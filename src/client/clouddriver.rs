//! # Clouddriver Client
//!
//! HTTP client for the manifest-serving and docker-image API.
//!
//! | call | endpoint |
//! |---|---|
//! | manifest | `GET /manifests/{account}/{namespace}/{kind name}` |
//! | images | `GET /dockerRegistry/images/find?account=&repository=[&tag=]` |

use super::{error_for_response, DockerImage, ImageLookup, ManifestApi};
use crate::config::PluginConfig;
use crate::error::ClientError;
use crate::manifest::Manifest;
use crate::observability::{metrics, OperationTracker};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, field::Empty, info_span, Instrument};

#[derive(Debug, Clone)]
pub struct ClouddriverClient {
    http: Client,
    base_url: Url,
    filtered_search: bool,
}

impl ClouddriverClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        filtered_search: bool,
    ) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("Invalid clouddriver base URL {base_url}: {e}"))?;
        Ok(Self {
            http,
            base_url,
            filtered_search,
        })
    }

    pub fn from_config(config: &PluginConfig) -> Result<Self, ClientError> {
        Self::new(
            &config.clouddriver_base_url,
            config.http_timeout(),
            config.docker_filtered_search,
        )
    }

    /// Base URL extended by percent-encoded path segments
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                anyhow::anyhow!(
                    "Clouddriver base URL cannot carry a path: {}",
                    self.base_url
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn images(
        &self,
        account: &str,
        repository: &str,
        tag: Option<&str>,
    ) -> Result<Vec<DockerImage>, ClientError> {
        let mut query = vec![("account", account), ("repository", repository)];
        if let Some(tag) = tag {
            query.push(("tag", tag));
        }
        let response = self
            .http
            .get(self.url(&["dockerRegistry", "images", "find"])?)
            .query(&query)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_for_response(response, &format!("images of {repository}")).await);
        }
        let images: Vec<DockerImage> = response.json().await?;
        debug!(
            "Found {} image(s) for {} in account {}",
            images.len(),
            repository,
            account
        );
        Ok(images)
    }
}

#[async_trait]
impl ManifestApi for ClouddriverClient {
    async fn get_manifest(
        &self,
        account: &str,
        namespace: &str,
        kind_qualified_name: &str,
    ) -> Result<Manifest, ClientError> {
        let span = info_span!(
            "manifest.fetch",
            account = account,
            namespace = namespace,
            manifest = kind_qualified_name,
            operation.duration_ms = Empty,
            operation.success = Empty,
            error.message = Empty,
        );
        let tracker = OperationTracker::new(span.clone());

        async move {
            metrics::increment_manifest_fetch();
            let url = self.url(&["manifests", account, namespace, kind_qualified_name])?;
            let response = self.http.get(url).send().await?;
            if !response.status().is_success() {
                let error = error_for_response(response, kind_qualified_name).await;
                if error.is_not_found() {
                    metrics::increment_manifest_not_found();
                    // absence is a valid outcome, not a failed operation
                    tracker.record_success();
                    return Err(error);
                }
                return tracker.finish(Err(error));
            }
            tracker.finish(response.json::<Manifest>().await.map_err(ClientError::from))
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl ImageLookup for ClouddriverClient {
    fn supports_filtered_search(&self) -> bool {
        self.filtered_search
    }

    async fn find_images(
        &self,
        account: &str,
        repository: &str,
        tag: &str,
    ) -> Result<Vec<DockerImage>, ClientError> {
        self.images(account, repository, Some(tag)).await
    }

    async fn list_images(
        &self,
        account: &str,
        repository: &str,
    ) -> Result<Vec<DockerImage>, ClientError> {
        self.images(account, repository, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encodes_kind_qualified_name() {
        let client =
            ClouddriverClient::new("http://clouddriver:7002/", Duration::from_secs(1), true)
                .unwrap();
        let url = client
            .url(&["manifests", "acct", "default", "deployment hello"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://clouddriver:7002/manifests/acct/default/deployment%20hello"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(matches!(
            ClouddriverClient::new("not a url", Duration::from_secs(1), true),
            Err(ClientError::Other(_))
        ));
    }
}
