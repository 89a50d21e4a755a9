use crate::error::RemoteClientError;
use crate::{RemoteApi, RemoteId};
use async_trait::async_trait;
use common::types::{EntityKind, EntityRef, EntitySpec};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredEntity {
    remote_id: RemoteId,
    spec: EntitySpec,
}

#[derive(Default, Debug)]
struct State {
    by_kind: HashMap<EntityKind, BTreeMap<String, StoredEntity>>,
}

/// In-process stand-in for the dashboarding service.
///
/// Cloning is cheap and every clone observes the same state.
#[derive(Clone, Default, Debug)]
pub struct MemoryRemote {
    inner: Arc<RwLock<State>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entity directly, bypassing the API. Returns the remote id.
    pub fn seed(&self, spec: EntitySpec) -> RemoteId {
        let remote_id = Uuid::new_v4().to_string();
        let mut g = self.inner.write();
        g.by_kind.entry(spec.kind()).or_default().insert(
            spec.id().to_string(),
            StoredEntity {
                remote_id: remote_id.clone(),
                spec,
            },
        );
        remote_id
    }

    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.inner
            .read()
            .by_kind
            .get(&entity.kind)
            .is_some_and(|m| m.contains_key(&entity.id))
    }

    pub fn entity(&self, entity: &EntityRef) -> Option<EntitySpec> {
        self.inner
            .read()
            .by_kind
            .get(&entity.kind)
            .and_then(|m| m.get(&entity.id))
            .map(|stored| stored.spec.clone())
    }

    pub fn remote_id(&self, entity: &EntityRef) -> Option<RemoteId> {
        self.inner
            .read()
            .by_kind
            .get(&entity.kind)
            .and_then(|m| m.get(&entity.id))
            .map(|stored| stored.remote_id.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_kind.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RemoteApi for MemoryRemote {
    async fn get(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<EntitySpec>, RemoteClientError> {
        Ok(self.entity(&EntityRef::new(kind, id)))
    }

    async fn create(&self, spec: &EntitySpec) -> Result<RemoteId, RemoteClientError> {
        let mut g = self.inner.write();
        let entities = g.by_kind.entry(spec.kind()).or_default();
        if entities.contains_key(spec.id()) {
            return Err(RemoteClientError::already_exists(format!(
                "{} already exists",
                spec.entity_ref()
            )));
        }
        let remote_id = Uuid::new_v4().to_string();
        entities.insert(
            spec.id().to_string(),
            StoredEntity {
                remote_id: remote_id.clone(),
                spec: spec.clone(),
            },
        );
        Ok(remote_id)
    }

    async fn update(&self, id: &str, spec: &EntitySpec) -> Result<(), RemoteClientError> {
        let mut g = self.inner.write();
        match g.by_kind.get_mut(&spec.kind()).and_then(|m| m.get_mut(id)) {
            Some(stored) => {
                stored.spec = spec.clone();
                Ok(())
            }
            None => Err(RemoteClientError::not_found(format!(
                "cannot update {}/{id}: it does not exist",
                spec.kind()
            ))),
        }
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), RemoteClientError> {
        let mut g = self.inner.write();
        match g.by_kind.get_mut(&kind).and_then(|m| m.remove(id)) {
            Some(_) => Ok(()),
            None => Err(RemoteClientError::not_found(format!(
                "cannot delete {kind}/{id}: it does not exist"
            ))),
        }
    }

    async fn list(&self, kind: EntityKind) -> Result<Vec<EntitySpec>, RemoteClientError> {
        Ok(self
            .inner
            .read()
            .by_kind
            .get(&kind)
            .map(|m| m.values().map(|stored| stored.spec.clone()).collect())
            .unwrap_or_default())
    }
}
