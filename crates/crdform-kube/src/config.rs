//! Provider configuration
//!
//! [`ProviderConfig`] is what a user writes (YAML or JSON). Configuring the
//! provider turns it into [`ProviderData`], the read-only bundle every
//! adapter receives: the dynamic client (absent in offline mode) plus the
//! apply and wait defaults.

use kube::Client;
use kube::config::{Config, KubeConfigOptions, Kubeconfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::client::{ApplyOptions, DynamicClient, KubeDynamicClient};
use crate::error::{ProviderError, Result};

/// Field manager used when neither the provider nor the resource sets one
pub const DEFAULT_FIELD_MANAGER: &str = "crdform";

/// Default time to wait for `wait_for` conditions
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 300;

/// Default delay between `wait_for` polls
pub const DEFAULT_WAIT_POLL_INTERVAL_MS: u64 = 2000;

/// User-facing provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Path to a kubeconfig file; inferred from the environment when unset
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one
    pub context: Option<String>,

    /// Never contact a cluster; only manifests can be rendered
    pub offline: bool,

    /// Default field manager for server-side apply
    pub field_manager: String,

    /// Default for forcing apply conflicts
    pub force_conflicts: bool,

    /// Upper bound on `wait_for` polling, in seconds
    pub wait_timeout_secs: u64,

    /// Delay between `wait_for` polls, in milliseconds
    pub wait_poll_interval_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            context: None,
            offline: false,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            force_conflicts: false,
            wait_timeout_secs: DEFAULT_WAIT_TIMEOUT_SECS,
            wait_poll_interval_ms: DEFAULT_WAIT_POLL_INTERVAL_MS,
        }
    }
}

impl ProviderConfig {
    /// Offline configuration with every other setting at its default
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Load from a YAML or JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse from YAML (JSON is accepted as a subset)
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.field_manager.is_empty() {
            return Err(ProviderError::ClientConfig(
                "field_manager must not be empty".to_string(),
            ));
        }
        if self.wait_poll_interval_ms == 0 {
            return Err(ProviderError::ClientConfig(
                "wait_poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the kube client configuration
    ///
    /// An explicit kubeconfig path (or path list) wins, then an explicit
    /// context in the default kubeconfig, then in-cluster or default
    /// inference.
    pub async fn client_config(&self) -> Result<Config> {
        let options = KubeConfigOptions {
            context: self.context.clone(),
            ..KubeConfigOptions::default()
        };
        let config = match (&self.kubeconfig, &self.context) {
            (Some(paths), _) => {
                let kubeconfig = read_kubeconfig(paths)?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(|e| ProviderError::ClientConfig(e.to_string()))?
            }
            (None, Some(_)) => Config::from_kubeconfig(&options)
                .await
                .map_err(|e| ProviderError::ClientConfig(e.to_string()))?,
            (None, None) => Config::infer()
                .await
                .map_err(|e| ProviderError::ClientConfig(e.to_string()))?,
        };
        Ok(config)
    }

    /// Build the provider data, connecting unless offline
    pub async fn connect(&self) -> Result<ProviderData> {
        self.check()?;
        if self.offline {
            debug!("provider configured in offline mode");
            return Ok(ProviderData::offline(self));
        }
        let config = self.client_config().await?;
        debug!(cluster_url = %config.cluster_url, "connecting to cluster");
        let client = Client::try_from(config).map_err(|e| ProviderError::ClientConfig(e.to_string()))?;
        Ok(ProviderData::with_client(self, Arc::new(KubeDynamicClient::new(client))))
    }
}

/// Read a kubeconfig path list (`KUBECONFIG` syntax), merging every file
///
/// Earlier files win on conflicting entries and on `current-context`.
pub fn read_kubeconfig(paths: &Path) -> Result<Kubeconfig> {
    let mut merged: Option<Kubeconfig> = None;
    for path in std::env::split_paths(paths).filter(|p| !p.as_os_str().is_empty()) {
        let next = Kubeconfig::read_from(&path)
            .map_err(|e| ProviderError::ClientConfig(format!("{}: {}", path.display(), e)))?;
        merged = Some(match merged {
            Some(current) => current
                .merge(next)
                .map_err(|e| ProviderError::ClientConfig(format!("{}: {}", path.display(), e)))?,
            None => next,
        });
    }
    merged.ok_or_else(|| ProviderError::ClientConfig("kubeconfig path list is empty".to_string()))
}

/// Read-only data handed to every adapter at configure time
#[derive(Clone)]
pub struct ProviderData {
    client: Option<Arc<dyn DynamicClient>>,
    pub field_manager: String,
    pub force_conflicts: bool,
    pub wait_timeout: Duration,
    pub wait_poll_interval: Duration,
}

impl std::fmt::Debug for ProviderData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderData")
            .field("offline", &self.client.is_none())
            .field("field_manager", &self.field_manager)
            .field("force_conflicts", &self.force_conflicts)
            .field("wait_timeout", &self.wait_timeout)
            .field("wait_poll_interval", &self.wait_poll_interval)
            .finish()
    }
}

impl ProviderData {
    pub fn offline(config: &ProviderConfig) -> Self {
        Self {
            client: None,
            field_manager: config.field_manager.clone(),
            force_conflicts: config.force_conflicts,
            wait_timeout: Duration::from_secs(config.wait_timeout_secs),
            wait_poll_interval: Duration::from_millis(config.wait_poll_interval_ms),
        }
    }

    pub fn with_client(config: &ProviderConfig, client: Arc<dyn DynamicClient>) -> Self {
        Self {
            client: Some(client),
            ..Self::offline(config)
        }
    }

    pub fn is_offline(&self) -> bool {
        self.client.is_none()
    }

    /// The dynamic client, or [`ProviderError::OfflineMode`]
    pub fn client(&self) -> Result<&dyn DynamicClient> {
        self.client.as_deref().ok_or(ProviderError::OfflineMode)
    }

    /// Apply options with per-resource overrides taking precedence
    pub fn apply_options(&self, field_manager: Option<&str>, force_conflicts: Option<bool>) -> ApplyOptions {
        ApplyOptions {
            field_manager: field_manager.unwrap_or(&self.field_manager).to_string(),
            force_conflicts: force_conflicts.unwrap_or(self.force_conflicts),
        }
    }
}
