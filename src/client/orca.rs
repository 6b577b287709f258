//! # Orca Client
//!
//! HTTP client for the orchestration API: deployment task submission and the
//! correlated-execution lookup used for in-progress detection.

use super::{error_for_response, ExecutionLookup, Task, TaskLauncher};
use crate::config::PluginConfig;
use crate::constants::DEPLOY_MANIFEST_STAGE;
use crate::error::ClientError;
use crate::observability::{metrics, OperationTracker};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{field::Empty, info, info_span, Instrument};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrchestrationRequest<'a> {
    application: &'a str,
    description: &'a str,
    job: Vec<Value>,
    trigger: Trigger<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Trigger<'a> {
    correlation_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct TaskRef {
    #[serde(rename = "ref")]
    reference: String,
}

#[derive(Debug, Clone)]
pub struct OrcaClient {
    http: Client,
    base_url: Url,
}

impl OrcaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("Invalid orca base URL {base_url}: {e}"))?;
        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &PluginConfig) -> Result<Self, ClientError> {
        Self::new(&config.orca_base_url, config.http_timeout())
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                anyhow::anyhow!("Orca base URL cannot carry a path: {}", self.base_url)
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_ops(&self, request: &OrchestrationRequest<'_>) -> Result<Task, ClientError> {
        let response = self
            .http
            .post(self.url(&["ops"])?)
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_for_response(response, "ops").await);
        }
        let task_ref: TaskRef = response.json().await?;
        // ref has the form /tasks/<id>
        let id = task_ref
            .reference
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(Task {
            id,
            name: request.description.to_string(),
        })
    }
}

/// Job stage with its `type` set to the deploy-manifest stage
fn deploy_stage(job: Value) -> Value {
    match job {
        Value::Object(mut stage) => {
            stage.insert("type".to_string(), json!(DEPLOY_MANIFEST_STAGE));
            Value::Object(stage)
        }
        other => json!({ "type": DEPLOY_MANIFEST_STAGE, "job": other }),
    }
}

#[async_trait]
impl TaskLauncher for OrcaClient {
    async fn submit_job(
        &self,
        resource_id: &str,
        application: &str,
        description: &str,
        correlation_id: &str,
        job: Value,
    ) -> Result<Task, ClientError> {
        let span = info_span!(
            "task.submit",
            resource.id = resource_id,
            application = application,
            correlation.id = correlation_id,
            operation.duration_ms = Empty,
            operation.success = Empty,
            error.message = Empty,
        );
        let tracker = OperationTracker::new(span.clone());

        async move {
            let request = OrchestrationRequest {
                application,
                description,
                job: vec![deploy_stage(job)],
                trigger: Trigger { correlation_id },
            };
            let result = self.post_ops(&request).await;

            if let Ok(task) = &result {
                metrics::increment_tasks_submitted();
                info!("Submitted task {} ({}) for {}", task.id, task.name, resource_id);
            }
            tracker.finish(result)
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl ExecutionLookup for OrcaClient {
    async fn get_correlated_executions(
        &self,
        correlation_id: &str,
    ) -> Result<Vec<String>, ClientError> {
        let url = self.url(&["executions", "correlated", correlation_id])?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(error_for_response(response, correlation_id).await);
        }
        Ok(response.json().await?)
    }
}
