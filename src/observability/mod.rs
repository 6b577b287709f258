//! # Observability
//!
//! Logging and metrics for the plugin.
//!
//! - `metrics`: Prometheus metrics collection
//! - `tracker`: duration/outcome recording on operation spans
//! - [`init_tracing`]: tracing subscriber setup for the host process or CLI
//! - [`init`]: tracing plus metrics registration, as configured

pub mod metrics;
pub mod tracker;

pub use tracker::OperationTracker;

use crate::config::PluginConfig;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise the filter is `k8s_resource_plugin=<log_level>`.
/// A subscriber installed earlier by the host is left in place.
pub fn init_tracing(config: &PluginConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("k8s_resource_plugin={}", config.log_level.to_lowercase()).into()
    });

    let result = if config.json_logs() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if let Err(e) = result {
        tracing::debug!("Tracing subscriber already installed: {}", e);
    }
}

/// Install tracing and, when enabled, register the plugin's metrics
#[allow(
    clippy::missing_errors_doc,
    reason = "Fails only when the metrics were already registered"
)]
pub fn init(config: &PluginConfig) -> anyhow::Result<()> {
    init_tracing(config);
    if config.enable_metrics {
        metrics::register_metrics()?;
        tracing::debug!("Registered plugin metrics");
    }
    Ok(())
}
