use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;

/// Contents of `provisioner.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionerProjectConfig {
    /// Path of the dashboard definition, relative to the config file.
    pub definition: PathBuf,
    pub remote: RemoteTarget,
    #[serde(default)]
    pub reconcile: ReconcileSettings,
}

/// Where reconciliation sends its CRUD calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RemoteTarget {
    Http {
        base_url: String,
        /// Name of the environment variable holding a bearer token.
        #[serde(default)]
        token_env: Option<String>,
    },
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconcileSettings {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    #[serde(default)]
    pub prune: bool,
    #[serde(default)]
    pub dry_run: bool,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_call_timeout_ms() -> u64 {
    DEFAULT_CALL_TIMEOUT_MS
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            prune: false,
            dry_run: false,
        }
    }
}

impl ReconcileSettings {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Fully resolved configuration handed to the pipeline.
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    pub definition_path: PathBuf,
    pub remote: RemoteTarget,
    pub reconcile: ReconcileSettings,
}
