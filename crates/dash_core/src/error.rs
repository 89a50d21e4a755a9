use common::config::error::{ConfigError, DefinitionError};
use dag::DagError;
use executor::ExecutorError;
use shared_clients::RemoteClientError;
use thiserror::Error;
use validator::ValidationErrors;

/// Everything that stops a provisioning run as a whole.
///
/// Per-entity remote failures are not in here; they are reported as
/// outcomes and the run carries on.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("could not read definition: {0}")]
    Definition(#[from] DefinitionError),
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("planning failed: {0}")]
    Plan(#[from] DagError),
    #[error("remote client error: {0}")]
    Remote(#[from] RemoteClientError),
    #[error("reconcile failed: {0}")]
    Executor(#[from] ExecutorError),
}
