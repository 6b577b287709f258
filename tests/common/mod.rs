//! Shared fakes for integration tests
//!
//! In-memory stand-ins for every collaborator behind [`HandlerContext`], each
//! recording what it was asked so tests can assert on calls as well as results.

#![allow(dead_code, reason = "Each test binary uses a different subset of the fakes")]

use async_trait::async_trait;
use k8s_resource_plugin::artifact::DeliveryArtifact;
use k8s_resource_plugin::client::{
    CredentialsProvider, DockerImage, ExecutionLookup, GitCommit, GitCredentials, GitTag,
    ImageLookup, ManifestApi, TagCache, TagSource, Task, TaskLauncher,
};
use k8s_resource_plugin::delivery::{
    ArtifactMetadata, DeliveryConfig, DeliveryConfigRepository, Environment,
};
use k8s_resource_plugin::error::ClientError;
use k8s_resource_plugin::events::{EventPublisher, ResourceEvent};
use k8s_resource_plugin::handler::HandlerContext;
use k8s_resource_plugin::manifest::Manifest;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static RUSTLS_INIT: Once = Once::new();

/// Install the ring crypto provider once per test binary
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

pub fn manifest(value: Value) -> Manifest {
    serde_json::from_value(value).expect("valid manifest")
}

/// Live objects keyed by namespace and kind-qualified name
///
/// Names registered with [`FakeManifestApi::fail`] answer with an HTTP status
/// error instead.
#[derive(Default)]
pub struct FakeManifestApi {
    objects: Mutex<HashMap<(String, String), Manifest>>,
    failures: Mutex<HashMap<String, u16>>,
    calls: AtomicUsize,
}

impl FakeManifestApi {
    pub fn insert(&self, manifest: Manifest) {
        let key = (
            manifest.namespace().to_string(),
            manifest.kind_qualified_name().expect("named manifest"),
        );
        self.objects.lock().unwrap().insert(key, manifest);
    }

    pub fn fail(&self, kind_qualified_name: &str, status: u16) {
        self.failures
            .lock()
            .unwrap()
            .insert(kind_qualified_name.to_string(), status);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManifestApi for FakeManifestApi {
    async fn get_manifest(
        &self,
        _account: &str,
        namespace: &str,
        kind_qualified_name: &str,
    ) -> Result<Manifest, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.failures.lock().unwrap().get(kind_qualified_name) {
            return Err(ClientError::Status {
                status: *status,
                body: "backend unavailable".to_string(),
            });
        }
        self.objects
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), kind_qualified_name.to_string()))
            .cloned()
            .ok_or_else(|| ClientError::not_found(kind_qualified_name))
    }
}

/// A job handed to the task launcher
#[derive(Debug, Clone)]
pub struct SubmittedJob {
    pub resource_id: String,
    pub application: String,
    pub description: String,
    pub correlation_id: String,
    pub job: Value,
}

#[derive(Default)]
pub struct RecordingTaskLauncher {
    jobs: Mutex<Vec<SubmittedJob>>,
}

impl RecordingTaskLauncher {
    pub fn jobs(&self) -> Vec<SubmittedJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskLauncher for RecordingTaskLauncher {
    async fn submit_job(
        &self,
        resource_id: &str,
        application: &str,
        description: &str,
        correlation_id: &str,
        job: Value,
    ) -> Result<Task, ClientError> {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.push(SubmittedJob {
            resource_id: resource_id.to_string(),
            application: application.to_string(),
            description: description.to_string(),
            correlation_id: correlation_id.to_string(),
            job,
        });
        Ok(Task {
            id: format!("task-{}", jobs.len()),
            name: description.to_string(),
        })
    }
}

/// In-flight executions keyed by correlation id
#[derive(Default)]
pub struct FakeExecutions {
    running: Mutex<HashMap<String, Vec<String>>>,
}

impl FakeExecutions {
    pub fn start(&self, correlation_id: &str, execution_id: &str) {
        self.running
            .lock()
            .unwrap()
            .entry(correlation_id.to_string())
            .or_default()
            .push(execution_id.to_string());
    }
}

#[async_trait]
impl ExecutionLookup for FakeExecutions {
    async fn get_correlated_executions(
        &self,
        correlation_id: &str,
    ) -> Result<Vec<String>, ClientError> {
        Ok(self
            .running
            .lock()
            .unwrap()
            .get(correlation_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// One delivery config with approvals per artifact reference
#[derive(Default)]
pub struct FakeDeliveryRepository {
    pub config: Option<DeliveryConfig>,
    /// Returned by `environment_for`; `None` falls back to the config's placement
    pub environment: Option<Environment>,
    approved: Mutex<HashMap<(String, String), String>>,
    metadata: Mutex<HashMap<(String, String), ArtifactMetadata>>,
}

impl FakeDeliveryRepository {
    pub fn new(config: DeliveryConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::default()
        }
    }

    /// Approve `version` of the artifact with `reference` in `environment`
    pub fn approve(&self, reference: &str, environment: &str, version: &str) {
        self.approved.lock().unwrap().insert(
            (reference.to_string(), environment.to_string()),
            version.to_string(),
        );
    }

    pub fn record_metadata(&self, reference: &str, version: &str, metadata: ArtifactMetadata) {
        self.metadata
            .lock()
            .unwrap()
            .insert((reference.to_string(), version.to_string()), metadata);
    }
}

#[async_trait]
impl DeliveryConfigRepository for FakeDeliveryRepository {
    async fn delivery_config_for(
        &self,
        _resource_id: &str,
    ) -> Result<Option<DeliveryConfig>, ClientError> {
        Ok(self.config.clone())
    }

    async fn environment_for(&self, _resource_id: &str) -> Result<Option<Environment>, ClientError> {
        Ok(self.environment.clone())
    }

    async fn latest_version_approved_in(
        &self,
        _config: &DeliveryConfig,
        artifact: &DeliveryArtifact,
        environment: &str,
    ) -> Result<Option<String>, ClientError> {
        Ok(self
            .approved
            .lock()
            .unwrap()
            .get(&(artifact.reference().to_string(), environment.to_string()))
            .cloned())
    }

    async fn get_artifact_version(
        &self,
        artifact: &DeliveryArtifact,
        version: &str,
        _status: Option<&str>,
    ) -> Result<Option<ArtifactMetadata>, ClientError> {
        Ok(self
            .metadata
            .lock()
            .unwrap()
            .get(&(artifact.reference().to_string(), version.to_string()))
            .cloned())
    }
}

/// Registry contents; counts every lookup
pub struct FakeImageLookup {
    filtered: bool,
    images: Mutex<Vec<DockerImage>>,
    calls: AtomicUsize,
}

impl FakeImageLookup {
    pub fn new(filtered: bool) -> Self {
        Self {
            filtered,
            images: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, image: DockerImage) {
        self.images.lock().unwrap().push(image);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn matching(&self, account: &str, repository: &str, tag: Option<&str>) -> Vec<DockerImage> {
        self.images
            .lock()
            .unwrap()
            .iter()
            .filter(|image| image.account == account && image.repository == repository)
            .filter(|image| tag.is_none_or(|tag| image.tag == tag))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ImageLookup for FakeImageLookup {
    fn supports_filtered_search(&self) -> bool {
        self.filtered
    }

    async fn find_images(
        &self,
        account: &str,
        repository: &str,
        tag: &str,
    ) -> Result<Vec<DockerImage>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.matching(account, repository, Some(tag)))
    }

    async fn list_images(
        &self,
        account: &str,
        repository: &str,
    ) -> Result<Vec<DockerImage>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.matching(account, repository, None))
    }
}

/// Tags and commits of every repository the source serves
#[derive(Default)]
pub struct FakeTagSource {
    tags: Mutex<Vec<GitTag>>,
    commits: Mutex<HashMap<String, GitCommit>>,
}

impl FakeTagSource {
    pub fn tag(&self, name: &str, sha: &str, repo_url: &str) {
        self.tags.lock().unwrap().push(GitTag {
            name: name.to_string(),
            commit_sha: sha.to_string(),
        });
        self.commits.lock().unwrap().insert(
            sha.to_string(),
            GitCommit {
                url: repo_url.to_string(),
                author: Some("delivery-bot".to_string()),
                date: Some("2024-05-01T12:00:00Z".to_string()),
                message: Some(format!("release {name}")),
            },
        );
    }
}

#[async_trait]
impl TagSource for FakeTagSource {
    async fn list_tags(&self, _project: &str, _repo_slug: &str) -> Result<Vec<GitTag>, ClientError> {
        Ok(self.tags.lock().unwrap().clone())
    }

    async fn get_commit(
        &self,
        _project: &str,
        _repo_slug: &str,
        sha: &str,
    ) -> Result<GitCommit, ClientError> {
        self.commits
            .lock()
            .unwrap()
            .get(sha)
            .cloned()
            .ok_or_else(|| ClientError::not_found(format!("commit {sha}")))
    }
}

/// Key-value tag cache supporting `<stem>:*` scans
#[derive(Default)]
pub struct FakeTagCache {
    entries: Mutex<HashMap<String, String>>,
}

impl FakeTagCache {
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl TagCache for FakeTagCache {
    async fn cached_versions(&self, pattern: &str) -> Result<Vec<String>, ClientError> {
        let stem = pattern.trim_end_matches('*');
        Ok(self
            .entries
            .lock()
            .unwrap()
            .keys()
            .filter(|key| key.starts_with(stem))
            .cloned()
            .collect())
    }

    async fn store(&self, key: &str, sha: &str) -> Result<(), ClientError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), sha.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeCredentials {
    accounts: Mutex<HashMap<String, (String, String)>>,
}

impl FakeCredentials {
    pub fn add(&self, account: &str, username: &str, password: &str) {
        self.accounts.lock().unwrap().insert(
            account.to_string(),
            (username.to_string(), password.to_string()),
        );
    }
}

#[async_trait]
impl CredentialsProvider for FakeCredentials {
    async fn credentials_for(&self, account: &str) -> Result<Option<GitCredentials>, ClientError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(account)
            .map(|(username, password)| GitCredentials {
                username: username.clone(),
                password: password.clone(),
            }))
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<ResourceEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<ResourceEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: ResourceEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Every fake, plus the context wiring them into handlers
pub struct Harness {
    pub manifests: Arc<FakeManifestApi>,
    pub tasks: Arc<RecordingTaskLauncher>,
    pub executions: Arc<FakeExecutions>,
    pub delivery: Arc<FakeDeliveryRepository>,
    pub images: Arc<FakeImageLookup>,
    pub credentials: Arc<FakeCredentials>,
    pub events: Arc<RecordingPublisher>,
}

impl Harness {
    pub fn new(delivery: FakeDeliveryRepository) -> Self {
        Self {
            manifests: Arc::new(FakeManifestApi::default()),
            tasks: Arc::new(RecordingTaskLauncher::default()),
            executions: Arc::new(FakeExecutions::default()),
            delivery: Arc::new(delivery),
            images: Arc::new(FakeImageLookup::new(true)),
            credentials: Arc::new(FakeCredentials::default()),
            events: Arc::new(RecordingPublisher::default()),
        }
    }

    #[must_use]
    pub fn with_images(mut self, images: FakeImageLookup) -> Self {
        self.images = Arc::new(images);
        self
    }

    pub fn context(&self) -> HandlerContext {
        HandlerContext {
            manifests: Arc::clone(&self.manifests) as Arc<dyn ManifestApi>,
            tasks: Arc::clone(&self.tasks) as Arc<dyn TaskLauncher>,
            executions: Arc::clone(&self.executions) as Arc<dyn ExecutionLookup>,
            delivery: Arc::clone(&self.delivery) as Arc<dyn DeliveryConfigRepository>,
            images: Arc::clone(&self.images) as Arc<dyn ImageLookup>,
            credentials: Arc::clone(&self.credentials) as Arc<dyn CredentialsProvider>,
            events: Arc::clone(&self.events) as Arc<dyn EventPublisher>,
        }
    }
}
