use async_trait::async_trait;
use common::types::{EntityKind, EntityRef, EntitySpec};
use parking_lot::Mutex;
use shared_clients::{MemoryRemote, RemoteApi, RemoteClientError, RemoteId};
use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    Get,
    Create,
    Update,
    Delete,
    List,
}

impl RemoteOp {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Delete)
    }
}

impl Display for RemoteOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

/// One call seen by a [`ScriptedRemote`]. `List` calls carry the id `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    pub op: RemoteOp,
    pub entity: EntityRef,
}

/// Holds a mutating call open until the test releases it.
#[derive(Clone, Default)]
pub struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Gate {
    /// Resolves once a call has reached the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn open(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

struct InFlightGuard<'a>(&'a InFlight);

impl InFlight {
    fn enter(&self) -> InFlightGuard<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightGuard(self)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct Script {
    failures: HashSet<(RemoteOp, EntityRef)>,
    list_failures: HashSet<EntityKind>,
    doubled_lists: HashSet<EntityKind>,
    delays: HashMap<EntityRef, Duration>,
    gates: HashMap<EntityRef, Gate>,
}

/// [`MemoryRemote`] with injectable failures, delays and gates, recording
/// every call it receives.
#[derive(Clone, Default)]
pub struct ScriptedRemote {
    store: MemoryRemote,
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Vec<RemoteCall>>>,
    in_flight: Arc<InFlight>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: MemoryRemote) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    pub fn store(&self) -> &MemoryRemote {
        &self.store
    }

    pub fn fail_on(&self, op: RemoteOp, entity: EntityRef) -> &Self {
        self.script.lock().failures.insert((op, entity));
        self
    }

    pub fn fail_list(&self, kind: EntityKind) -> &Self {
        self.script.lock().list_failures.insert(kind);
        self
    }

    /// Return every entity of `kind` twice from `list`.
    pub fn double_list(&self, kind: EntityKind) -> &Self {
        self.script.lock().doubled_lists.insert(kind);
        self
    }

    /// Delay mutating calls on `entity`.
    pub fn delay_on(&self, entity: EntityRef, delay: Duration) -> &Self {
        self.script.lock().delays.insert(entity, delay);
        self
    }

    /// Block mutating calls on `entity` until the returned gate is opened.
    pub fn gate_on(&self, entity: EntityRef) -> Gate {
        let gate = Gate::default();
        self.script.lock().gates.insert(entity, gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    pub fn mutations(&self) -> Vec<RemoteCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.op.is_mutation())
            .cloned()
            .collect()
    }

    pub fn calls_for(&self, entity: &EntityRef) -> Vec<RemoteOp> {
        self.calls
            .lock()
            .iter()
            .filter(|c| &c.entity == entity)
            .map(|c| c.op)
            .collect()
    }

    /// Most calls that were ever running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak.load(Ordering::SeqCst)
    }

    async fn intercept(&self, op: RemoteOp, entity: EntityRef) -> Result<(), RemoteClientError> {
        let _running = self.in_flight.enter();
        self.calls.lock().push(RemoteCall {
            op,
            entity: entity.clone(),
        });

        let (failing, delay, gate) = {
            let script = self.script.lock();
            let failing = if op == RemoteOp::List {
                script.list_failures.contains(&entity.kind)
            } else {
                script.failures.contains(&(op, entity.clone()))
            };
            let (delay, gate) = if op.is_mutation() {
                (
                    script.delays.get(&entity).copied(),
                    script.gates.get(&entity).cloned(),
                )
            } else {
                (None, None)
            };
            (failing, delay, gate)
        };

        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if failing {
            return Err(RemoteClientError::unexpected(format!(
                "scripted {op} failure for {entity}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteApi for ScriptedRemote {
    async fn get(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<EntitySpec>, RemoteClientError> {
        self.intercept(RemoteOp::Get, EntityRef::new(kind, id)).await?;
        self.store.get(kind, id).await
    }

    async fn create(&self, spec: &EntitySpec) -> Result<RemoteId, RemoteClientError> {
        self.intercept(RemoteOp::Create, spec.entity_ref()).await?;
        self.store.create(spec).await
    }

    async fn update(&self, id: &str, spec: &EntitySpec) -> Result<(), RemoteClientError> {
        self.intercept(RemoteOp::Update, EntityRef::new(spec.kind(), id))
            .await?;
        self.store.update(id, spec).await
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), RemoteClientError> {
        self.intercept(RemoteOp::Delete, EntityRef::new(kind, id))
            .await?;
        self.store.delete(kind, id).await
    }

    async fn list(&self, kind: EntityKind) -> Result<Vec<EntitySpec>, RemoteClientError> {
        self.intercept(RemoteOp::List, EntityRef::new(kind, "*")).await?;
        let listed = self.store.list(kind).await?;
        if self.script.lock().doubled_lists.contains(&kind) {
            return Ok(listed.iter().chain(&listed).cloned().collect());
        }
        Ok(listed)
    }
}
