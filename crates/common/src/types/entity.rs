use crate::types::{DataSource, Dataset, Filter, RefreshSchedule, Visual};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Anything declared in a dashboard definition that is addressed by a string id.
pub trait Identified {
    fn identifier(&self) -> &str;
}

/// The kinds of entity the provisioner manages on the remote service.
///
/// The declaration order of the variants is the apply order; destroy runs the
/// other way round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    DataSource,
    Dataset,
    Visual,
    Filter,
    RefreshSchedule,
}

impl EntityKind {
    pub const APPLY_ORDER: [EntityKind; 5] = [
        EntityKind::DataSource,
        EntityKind::Dataset,
        EntityKind::Visual,
        EntityKind::Filter,
        EntityKind::RefreshSchedule,
    ];

    pub fn rank(&self) -> u8 {
        match self {
            Self::DataSource => 0,
            Self::Dataset => 1,
            Self::Visual => 2,
            Self::Filter => 3,
            Self::RefreshSchedule => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataSource => "data_source",
            Self::Dataset => "dataset",
            Self::Visual => "visual",
            Self::Filter => "filter",
            Self::RefreshSchedule => "refresh_schedule",
        }
    }

    /// Kinds in teardown order.
    pub fn destroy_order() -> impl Iterator<Item = EntityKind> {
        Self::APPLY_ORDER.into_iter().rev()
    }

    /// Kinds whose entities can hold a hard reference to an entity of this kind.
    pub fn hard_dependent_kinds(&self) -> &'static [EntityKind] {
        match self {
            Self::DataSource => &[EntityKind::Dataset],
            Self::Dataset => &[EntityKind::Visual, EntityKind::RefreshSchedule],
            Self::Visual | Self::Filter | Self::RefreshSchedule => &[],
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of a single entity, unique across the whole definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Declared (or observed) state of one entity, as exchanged with the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "spec", rename_all = "snake_case")]
pub enum EntitySpec {
    DataSource(DataSource),
    Dataset(Dataset),
    Visual(Visual),
    Filter(Filter),
    RefreshSchedule(RefreshSchedule),
}

impl EntitySpec {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::DataSource(_) => EntityKind::DataSource,
            Self::Dataset(_) => EntityKind::Dataset,
            Self::Visual(_) => EntityKind::Visual,
            Self::Filter(_) => EntityKind::Filter,
            Self::RefreshSchedule(_) => EntityKind::RefreshSchedule,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::DataSource(s) => s.identifier(),
            Self::Dataset(d) => d.identifier(),
            Self::Visual(v) => v.identifier(),
            Self::Filter(f) => f.identifier(),
            Self::RefreshSchedule(s) => s.identifier(),
        }
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.kind(), self.id())
    }

    /// Whether this entity cannot exist on the remote without `other`.
    ///
    /// A refresh schedule covers every dataset. Filters only order after
    /// visuals and never hold a hard reference.
    pub fn references(&self, other: &EntityRef) -> bool {
        match (self, other.kind) {
            (Self::Dataset(d), EntityKind::DataSource) => d.data_source == other.id,
            (Self::Visual(v), EntityKind::Dataset) => v.dataset == other.id,
            (Self::RefreshSchedule(_), EntityKind::Dataset) => true,
            _ => false,
        }
    }

    /// Serialize only the inner entity, the body the HTTP API expects.
    pub fn to_body(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::DataSource(s) => serde_json::to_value(s),
            Self::Dataset(d) => serde_json::to_value(d),
            Self::Visual(v) => serde_json::to_value(v),
            Self::Filter(f) => serde_json::to_value(f),
            Self::RefreshSchedule(s) => serde_json::to_value(s),
        }
    }

    /// Inverse of [`EntitySpec::to_body`].
    pub fn from_body(kind: EntityKind, body: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            EntityKind::DataSource => Self::DataSource(serde_json::from_value(body)?),
            EntityKind::Dataset => Self::Dataset(serde_json::from_value(body)?),
            EntityKind::Visual => Self::Visual(serde_json::from_value(body)?),
            EntityKind::Filter => Self::Filter(serde_json::from_value(body)?),
            EntityKind::RefreshSchedule => Self::RefreshSchedule(serde_json::from_value(body)?),
        })
    }
}

impl From<DataSource> for EntitySpec {
    fn from(value: DataSource) -> Self {
        Self::DataSource(value)
    }
}

impl From<Dataset> for EntitySpec {
    fn from(value: Dataset) -> Self {
        Self::Dataset(value)
    }
}

impl From<Visual> for EntitySpec {
    fn from(value: Visual) -> Self {
        Self::Visual(value)
    }
}

impl From<Filter> for EntitySpec {
    fn from(value: Filter) -> Self {
        Self::Filter(value)
    }
}

impl From<RefreshSchedule> for EntitySpec {
    fn from(value: RefreshSchedule) -> Self {
        Self::RefreshSchedule(value)
    }
}
