//! # Plugin Configuration
//!
//! Plugin-level settings loaded from environment variables.

use crate::constants::{DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_TAG_CACHE_PREFIX};
use std::time::Duration;

/// Plugin-level configuration
///
/// All settings have defaults and can be overridden via environment variables.
/// The host process usually populates them from a ConfigMap with `envFrom`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    /// Base URL of the manifest-serving and docker-image API
    pub clouddriver_base_url: String,
    /// Base URL of the orchestration API (task submission, correlated executions)
    pub orca_base_url: String,
    /// Timeout for every collaborator HTTP call (seconds)
    pub http_timeout_secs: u64,
    /// Key prefix used by the external tag cache
    pub tag_cache_prefix: String,
    /// Whether the docker image API accepts a tag filter
    /// When false, the resolver lists all images and scans for an exact match
    pub docker_filtered_search: bool,
    /// Global log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            clouddriver_base_url: "http://clouddriver:7002".to_string(),
            orca_base_url: "http://orca:8083".to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            tag_cache_prefix: DEFAULT_TAG_CACHE_PREFIX.to_string(),
            docker_filtered_search: true,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            enable_metrics: true,
        }
    }
}

impl PluginConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            clouddriver_base_url: env_var_or_default_str(
                "CLOUDDRIVER_BASE_URL",
                &defaults.clouddriver_base_url,
            ),
            orca_base_url: env_var_or_default_str("ORCA_BASE_URL", &defaults.orca_base_url),
            http_timeout_secs: env_var_or_default("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
            tag_cache_prefix: env_var_or_default_str("TAG_CACHE_PREFIX", &defaults.tag_cache_prefix),
            docker_filtered_search: env_var_or_default_bool(
                "DOCKER_FILTERED_SEARCH",
                defaults.docker_filtered_search,
            ),
            log_level: env_var_or_default_str("LOG_LEVEL", &defaults.log_level),
            log_format: env_var_or_default_str("LOG_FORMAT", &defaults.log_format),
            enable_metrics: env_var_or_default_bool("ENABLE_METRICS", defaults.enable_metrics),
        }
    }

    /// Get the collaborator HTTP timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Whether logs should be emitted as JSON lines
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as boolean or return default
fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| parse_bool(&v))
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower == "true" || lower == "1" || lower == "yes" || lower == "on"
}
