//! # Metrics
//!
//! Prometheus metrics for monitoring resource resolution and reconciliation.
//!
//! ## Metrics Exposed
//!
//! - `k8s_resource_plugin_resolutions_total{handler}` - Desired-state resolutions
//! - `k8s_resource_plugin_resolution_errors_total{reason}` - Failed resolutions by reason
//! - `k8s_resource_plugin_resolution_duration_seconds` - Duration of desired-state resolution
//! - `k8s_resource_plugin_manifest_fetch_total` - Current-state manifest fetches
//! - `k8s_resource_plugin_manifest_not_found_total` - Fetches answered with "not found"
//! - `k8s_resource_plugin_tasks_submitted_total` - Deployment tasks submitted
//! - `k8s_resource_plugin_events_published_total{event}` - Events published
//! - `k8s_resource_plugin_git_versions_discovered_total` - Newly discovered git tags

use anyhow::Result;
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RESOLUTIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "k8s_resource_plugin_resolutions_total",
            "Total number of desired-state resolutions by handler",
        ),
        &["handler"],
    )
    .expect("Failed to create RESOLUTIONS_TOTAL metric - this should never happen")
});

static RESOLUTION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "k8s_resource_plugin_resolution_errors_total",
            "Total number of failed resolutions by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create RESOLUTION_ERRORS_TOTAL metric - this should never happen")
});

static RESOLUTION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "k8s_resource_plugin_resolution_duration_seconds",
            "Duration of desired-state resolution in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
    )
    .expect("Failed to create RESOLUTION_DURATION metric - this should never happen")
});

static MANIFEST_FETCH_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "k8s_resource_plugin_manifest_fetch_total",
        "Total number of current-state manifest fetches",
    )
    .expect("Failed to create MANIFEST_FETCH_TOTAL metric - this should never happen")
});

static MANIFEST_NOT_FOUND_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "k8s_resource_plugin_manifest_not_found_total",
        "Total number of manifest fetches answered with not found",
    )
    .expect("Failed to create MANIFEST_NOT_FOUND_TOTAL metric - this should never happen")
});

static TASKS_SUBMITTED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "k8s_resource_plugin_tasks_submitted_total",
        "Total number of deployment tasks submitted",
    )
    .expect("Failed to create TASKS_SUBMITTED_TOTAL metric - this should never happen")
});

static EVENTS_PUBLISHED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "k8s_resource_plugin_events_published_total",
            "Total number of events published by event type",
        ),
        &["event"],
    )
    .expect("Failed to create EVENTS_PUBLISHED_TOTAL metric - this should never happen")
});

static GIT_VERSIONS_DISCOVERED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "k8s_resource_plugin_git_versions_discovered_total",
        "Total number of newly discovered git tags",
    )
    .expect("Failed to create GIT_VERSIONS_DISCOVERED_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Registration only fails when a metric is registered twice"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RESOLUTIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RESOLUTION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RESOLUTION_DURATION.clone()))?;
    REGISTRY.register(Box::new(MANIFEST_FETCH_TOTAL.clone()))?;
    REGISTRY.register(Box::new(MANIFEST_NOT_FOUND_TOTAL.clone()))?;
    REGISTRY.register(Box::new(TASKS_SUBMITTED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(EVENTS_PUBLISHED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GIT_VERSIONS_DISCOVERED_TOTAL.clone()))?;

    Ok(())
}

/// Render every registered metric in the Prometheus text format
#[allow(
    clippy::missing_errors_doc,
    reason = "Encoding only fails on invalid UTF-8, which the text encoder never emits"
)]
pub fn encode_metrics() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn increment_resolutions(handler: &str) {
    RESOLUTIONS_TOTAL.with_label_values(&[handler]).inc();
}

pub fn increment_resolution_errors(reason: &str) {
    RESOLUTION_ERRORS_TOTAL.with_label_values(&[reason]).inc();
}

pub fn observe_resolution_duration(duration: f64) {
    RESOLUTION_DURATION.observe(duration);
}

pub fn increment_manifest_fetch() {
    MANIFEST_FETCH_TOTAL.inc();
}

pub fn increment_manifest_not_found() {
    MANIFEST_NOT_FOUND_TOTAL.inc();
}

pub fn increment_tasks_submitted() {
    TASKS_SUBMITTED_TOTAL.inc();
}

pub fn increment_events_published(event: &str) {
    EVENTS_PUBLISHED_TOTAL.with_label_values(&[event]).inc();
}

pub fn increment_git_versions_discovered(count: usize) {
    GIT_VERSIONS_DISCOVERED_TOTAL.inc_by(count as u64);
}
