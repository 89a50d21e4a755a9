pub mod error;
pub mod http;
pub mod memory;

pub use crate::error::RemoteClientError;
pub use crate::http::HttpRemoteClient;
pub use crate::memory::MemoryRemote;

use async_trait::async_trait;
use common::config::components::provisioner::RemoteTarget;
use common::types::{EntityKind, EntitySpec};
use std::sync::Arc;

/// Identifier the remote service assigns to a created entity.
pub type RemoteId = String;

/// CRUD contract of the remote dashboarding service.
///
/// Entities are addressed by kind plus their declared identifier. Every call
/// may fail independently; callers decide what a failure means for the rest
/// of a run.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// `Ok(None)` when the remote has no such entity.
    async fn get(&self, kind: EntityKind, id: &str)
        -> Result<Option<EntitySpec>, RemoteClientError>;

    async fn create(&self, spec: &EntitySpec) -> Result<RemoteId, RemoteClientError>;

    async fn update(&self, id: &str, spec: &EntitySpec) -> Result<(), RemoteClientError>;

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), RemoteClientError>;

    async fn list(&self, kind: EntityKind) -> Result<Vec<EntitySpec>, RemoteClientError>;
}

#[async_trait]
impl<T> RemoteApi for Arc<T>
where
    T: RemoteApi + ?Sized,
{
    async fn get(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<EntitySpec>, RemoteClientError> {
        (**self).get(kind, id).await
    }

    async fn create(&self, spec: &EntitySpec) -> Result<RemoteId, RemoteClientError> {
        (**self).create(spec).await
    }

    async fn update(&self, id: &str, spec: &EntitySpec) -> Result<(), RemoteClientError> {
        (**self).update(id, spec).await
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), RemoteClientError> {
        (**self).delete(kind, id).await
    }

    async fn list(&self, kind: EntityKind) -> Result<Vec<EntitySpec>, RemoteClientError> {
        (**self).list(kind).await
    }
}

pub type SharedRemote = Arc<dyn RemoteApi>;

pub fn create_remote_client(target: &RemoteTarget) -> Result<SharedRemote, RemoteClientError> {
    match target {
        RemoteTarget::Http {
            base_url,
            token_env,
        } => {
            let token = match token_env {
                Some(var) => Some(std::env::var(var).map_err(|_| {
                    RemoteClientError::configuration(format!(
                        "environment variable '{var}' holding the API token is not set"
                    ))
                })?),
                None => None,
            };
            Ok(Arc::new(HttpRemoteClient::new(base_url, token)?))
        }
        RemoteTarget::Memory => Ok(Arc::new(MemoryRemote::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_variable_is_a_configuration_error() {
        let target = RemoteTarget::Http {
            base_url: "http://localhost:9".into(),
            token_env: Some("DASH_PROVISIONER_TEST_TOKEN_NEVER_SET".into()),
        };
        assert!(matches!(
            create_remote_client(&target),
            Err(RemoteClientError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn memory_target_builds_an_empty_remote() {
        let remote = create_remote_client(&RemoteTarget::Memory).unwrap();
        assert!(remote.list(EntityKind::Visual).await.unwrap().is_empty());
    }
}
