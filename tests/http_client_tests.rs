//! # Collaborator HTTP Client Tests
//!
//! The clouddriver and orca clients against wiremock servers.
//!
//! These tests verify:
//! - Request paths, query strings and bodies
//! - 404 mapped to `NotFound`, other failures kept as status errors
//! - Task ids parsed from the orchestrator's task reference

mod common;

use common::init_rustls;
use k8s_resource_plugin::client::{
    ClouddriverClient, ExecutionLookup, ImageLookup, ManifestApi, OrcaClient, TaskLauncher,
};
use k8s_resource_plugin::error::ClientError;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn clouddriver(server: &MockServer, filtered: bool) -> ClouddriverClient {
    init_rustls();
    ClouddriverClient::new(&server.uri(), TIMEOUT, filtered).unwrap()
}

fn orca(server: &MockServer) -> OrcaClient {
    init_rustls();
    OrcaClient::new(&server.uri(), TIMEOUT).unwrap()
}

#[tokio::test]
async fn test_get_manifest_encodes_kind_qualified_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manifests/acct/default/deployment%20hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "hello", "namespace": "default"},
            "spec": {"replicas": 3},
            "status": {"conditions": [{"type": "Available", "status": "True"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = clouddriver(&server, true);
    let manifest = client
        .get_manifest("acct", "default", "deployment hello")
        .await
        .unwrap();
    assert_eq!(manifest.kind.as_deref(), Some("Deployment"));
    assert_eq!(manifest.name().unwrap(), "hello");
    assert_eq!(manifest.status.unwrap().conditions.len(), 1);
}

#[tokio::test]
async fn test_get_manifest_maps_404_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = clouddriver(&server, true);
    let result = client
        .get_manifest("acct", "default", "deployment missing")
        .await;
    assert!(matches!(result, Err(ClientError::NotFound { .. })));
}

#[tokio::test]
async fn test_get_manifest_keeps_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let client = clouddriver(&server, true);
    let error = client
        .get_manifest("acct", "default", "deployment hello")
        .await
        .unwrap_err();
    assert!(!error.is_not_found());
    assert!(matches!(
        error,
        ClientError::Status { status: 500, ref body } if body == "backend unavailable"
    ));
}

#[tokio::test]
async fn test_find_images_filters_by_tag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dockerRegistry/images/find"))
        .and(query_param("account", "registry"))
        .and(query_param("repository", "org/hello"))
        .and(query_param("tag", "1.4.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "account": "registry",
            "repository": "org/hello",
            "tag": "1.4.0",
            "digest": "sha256:aaa",
            "registry": "registry.example.com"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let client = clouddriver(&server, true);
    assert!(client.supports_filtered_search());
    let images = client
        .find_images("registry", "org/hello", "1.4.0")
        .await
        .unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(
        images[0].pinned_reference(),
        "registry.example.com/org/hello@sha256:aaa"
    );
}

#[tokio::test]
async fn test_list_images_sends_no_tag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dockerRegistry/images/find"))
        .and(query_param("repository", "org/hello"))
        .and(query_param_is_missing("tag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"account": "registry", "repository": "org/hello", "tag": "1.3.0", "digest": "sha256:old"},
            {"account": "registry", "repository": "org/hello", "tag": "1.4.0", "digest": "sha256:aaa"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = clouddriver(&server, false);
    assert!(!client.supports_filtered_search());
    let images = client.list_images("registry", "org/hello").await.unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].pinned_reference(), "org/hello@sha256:old");
}

#[tokio::test]
async fn test_submit_job_posts_deploy_stage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ops"))
        .and(body_partial_json(json!({
            "application": "fnord",
            "description": "Deploy acct-default-deployment-hello to acct",
            "job": [{"type": "deployManifest", "cloudProvider": "kubernetes"}],
            "trigger": {"correlationId": "hello"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ref": "/tasks/01HXYZ"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = orca(&server);
    let task = client
        .submit_job(
            "acct-default-deployment-hello",
            "fnord",
            "Deploy acct-default-deployment-hello to acct",
            "hello",
            json!({"cloudProvider": "kubernetes", "manifests": []}),
        )
        .await
        .unwrap();
    assert_eq!(task.id, "01HXYZ");
    assert_eq!(task.name, "Deploy acct-default-deployment-hello to acct");
}

#[tokio::test]
async fn test_submit_job_surfaces_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ops"))
        .respond_with(ResponseTemplate::new(400).set_body_string("application required"))
        .mount(&server)
        .await;

    let client = orca(&server);
    let result = client
        .submit_job("id", "", "Deploy id to acct", "id", json!({}))
        .await;
    assert!(matches!(result, Err(ClientError::Status { status: 400, .. })));
}

#[tokio::test]
async fn test_correlated_executions_escape_correlation_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/executions/correlated/k8s%2Fkustomize@v1:acct-flux-system-kustomization-fnord",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["01HABC"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = orca(&server);
    let executions = client
        .get_correlated_executions("k8s/kustomize@v1:acct-flux-system-kustomization-fnord")
        .await
        .unwrap();
    assert_eq!(executions, vec!["01HABC"]);
}

#[tokio::test]
async fn test_no_correlated_executions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/executions/correlated/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = orca(&server);
    assert!(client
        .get_correlated_executions("hello")
        .await
        .unwrap()
        .is_empty());
}
