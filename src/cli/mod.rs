//! # resourcectl
//!
//! Offline diagnostics for managed Kubernetes resources.
//!
//! ## Usage
//!
//! ```bash
//! # Strip server-managed fields from a manifest
//! resourcectl cleanup deployment.yaml
//!
//! # Diff a desired manifest against a saved copy of the live object
//! resourcectl diff desired.yaml --current live.yaml
//!
//! # Diff a desired manifest against the cluster in the current kube context
//! resourcectl diff desired.yaml
//!
//! # Render the Flux GitRepository generated for an artifact
//! resourcectl git-source --name my-app --url https://github.com/org/my-app \
//!     --version 1.2.3 --environment staging
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use k8s_resource_plugin::artifact::{GitRepoArtifact, GitType, TagVersionStrategy};
use k8s_resource_plugin::client::{KubeManifestApi, ManifestApi};
use k8s_resource_plugin::config::PluginConfig;
use k8s_resource_plugin::constants::{DEFAULT_ARTIFACT_INTERVAL, DEFAULT_ARTIFACT_NAMESPACE};
use k8s_resource_plugin::diff::ResourceDiff;
use k8s_resource_plugin::manifest::{cleanup, Manifest};
use k8s_resource_plugin::observability;
use k8s_resource_plugin::resolver::generate_git_repo_manifest;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Kubernetes resource plugin CLI
#[derive(Parser, Debug)]
#[command(name = "resourcectl")]
#[command(version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BUILD_GIT_HASH"),
    ", built ",
    env!("BUILD_DATETIME"),
    ")"
))]
#[command(
    about = "Inspect managed Kubernetes resources offline",
    long_about = None,
    after_help = "\
Examples:
  resourcectl cleanup deployment.yaml
  resourcectl diff desired.yaml --current live.yaml
  resourcectl git-source --name my-app --url https://github.com/org/my-app --version 1.2.3
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a manifest with server-managed fields removed
    Cleanup {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Show what an upsert would change
    Diff {
        /// Desired manifest
        #[arg(value_name = "DESIRED")]
        desired: PathBuf,

        /// Saved copy of the live object; fetched from the cluster when omitted
        #[arg(long, value_name = "FILE")]
        current: Option<PathBuf>,

        /// Account passed to the manifest API
        #[arg(long, default_value = "local")]
        account: String,
    },
    /// Print the Flux GitRepository generated for a git artifact
    GitSource {
        #[arg(long)]
        name: String,

        #[arg(long)]
        url: String,

        #[arg(long, default_value = DEFAULT_ARTIFACT_NAMESPACE)]
        namespace: String,

        #[arg(long, default_value = DEFAULT_ARTIFACT_INTERVAL)]
        interval: String,

        /// Tag to pin; the source tracks the default branch when omitted
        #[arg(long)]
        version: Option<String>,

        /// Environment suffix of the generated name
        #[arg(long)]
        environment: Option<String>,

        /// Secret holding the clone credentials
        #[arg(long)]
        secret_ref: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // kube and reqwest both run on rustls; pick the ring provider before any TLS use
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    observability::init(&PluginConfig::from_env()).context("Failed to initialise observability")?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Cleanup { file } => {
            let manifest = read_manifest(&file)?;
            print!("{}", to_yaml(&cleanup(&manifest))?);
            Ok(())
        }
        Commands::Diff {
            desired,
            current,
            account,
        } => diff_command(&desired, current.as_deref(), &account).await,
        Commands::GitSource {
            name,
            url,
            namespace,
            interval,
            version,
            environment,
            secret_ref,
        } => {
            let artifact = git_artifact(name, namespace, interval, secret_ref);
            let manifest = generate_git_repo_manifest(
                &artifact,
                &url,
                version.as_deref(),
                environment.as_deref(),
            );
            print!("{}", to_yaml(&manifest)?);
            Ok(())
        }
    }
}

fn read_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse {} as a manifest", path.display()))
}

fn to_yaml(manifest: &Manifest) -> Result<String> {
    serde_yaml::to_string(manifest).context("Failed to render manifest as YAML")
}

/// Artifact carrying only the fields that shape the generated source object
fn git_artifact(
    name: String,
    namespace: String,
    interval: String,
    secret_ref: Option<String>,
) -> GitRepoArtifact {
    GitRepoArtifact {
        reference: name.clone(),
        repo_name: name.clone(),
        name,
        project: String::new(),
        git_type: GitType::Github,
        namespace,
        interval,
        secret_ref,
        tag_version_strategy: TagVersionStrategy::default(),
    }
}

async fn fetch_live(desired: &Manifest, account: &str) -> Result<Option<Manifest>> {
    let api = KubeManifestApi::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;
    let kind_qualified_name = desired.kind_qualified_name()?;
    match api
        .get_manifest(account, desired.namespace(), &kind_qualified_name)
        .await
    {
        Ok(manifest) => Ok(Some(manifest)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to fetch {kind_qualified_name}")),
    }
}

fn render_diff(diff: &ResourceDiff) -> String {
    if !diff.has_changes() {
        return "No changes\n".to_string();
    }
    diff.entries()
        .iter()
        .map(|entry| format!("{entry}\n"))
        .collect()
}

async fn diff_command(desired: &Path, current: Option<&Path>, account: &str) -> Result<()> {
    let desired = read_manifest(desired)?;
    let current = match current {
        Some(path) => Some(read_manifest(path)?),
        None => fetch_live(&desired, account).await?,
    };

    let diff = ResourceDiff::new(cleanup(&desired), current.as_ref().map(cleanup))?;
    print!("{}", render_diff(&diff));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest(value: serde_json::Value) -> Manifest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_diff_defaults_account() {
        let cli = Cli::try_parse_from(["resourcectl", "diff", "desired.yaml"]).unwrap();
        match cli.command {
            Commands::Diff {
                desired,
                current,
                account,
            } => {
                assert_eq!(desired, PathBuf::from("desired.yaml"));
                assert!(current.is_none());
                assert_eq!(account, "local");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_git_source_defaults() {
        let cli = Cli::try_parse_from([
            "resourcectl",
            "git-source",
            "--name",
            "my-app",
            "--url",
            "https://github.com/org/my-app",
        ])
        .unwrap();
        match cli.command {
            Commands::GitSource {
                namespace,
                interval,
                version,
                ..
            } => {
                assert_eq!(namespace, "flux-system");
                assert_eq!(interval, "1m");
                assert!(version.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_git_source_requires_url() {
        let result = Cli::try_parse_from(["resourcectl", "git-source", "--name", "my-app"]);
        assert!(matches!(result, Err(ref e) if e.kind() == clap::error::ErrorKind::MissingRequiredArgument));
    }

    #[test]
    fn test_git_artifact_feeds_generated_source() {
        let artifact = git_artifact(
            "my-app".to_string(),
            "flux-system".to_string(),
            "5m".to_string(),
            Some("git-creds".to_string()),
        );
        let generated = generate_git_repo_manifest(
            &artifact,
            "https://github.com/org/my-app",
            Some("1.2.3"),
            Some("staging"),
        );
        let value = generated.to_value().unwrap();
        assert_eq!(value["metadata"]["name"], "my-app-staging");
        assert_eq!(value["spec"]["interval"], "5m");
        assert_eq!(value["spec"]["ref"]["tag"], "1.2.3");
        assert_eq!(value["spec"]["secretRef"]["name"], "git-creds");
    }

    #[test]
    fn test_render_diff_without_changes() {
        let desired = manifest(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "settings", "namespace": "default"},
            "data": {"mode": "fast"}
        }));
        let diff = ResourceDiff::new(desired.clone(), Some(desired)).unwrap();
        assert_eq!(render_diff(&diff), "No changes\n");
    }

    #[test]
    fn test_render_diff_lists_entries() {
        let desired = manifest(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "settings", "namespace": "default"},
            "data": {"mode": "fast"}
        }));
        let current = manifest(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "settings", "namespace": "default"},
            "data": {"mode": "slow"}
        }));
        let diff = ResourceDiff::new(desired, Some(current)).unwrap();
        let rendered = render_diff(&diff);
        assert_eq!(rendered.lines().count(), 1);
        assert!(rendered.contains("/data/mode"));
    }

    #[test]
    fn test_read_manifest_reports_path() {
        let missing = std::env::temp_dir().join("resourcectl-missing-manifest.yaml");
        let error = read_manifest(&missing).unwrap_err();
        assert!(error.to_string().contains("resourcectl-missing-manifest.yaml"));
    }
}
