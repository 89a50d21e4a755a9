use crate::error::DagError;
use common::types::{EntityKind, EntityRef, EntitySpec};
use std::fmt::{Display, Formatter};

pub type DagResult<T> = Result<T, DagError>;

/// Kind of "must exist before" relationship between two entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DependencyEdge {
    /// The dependent cannot be provisioned unless the dependency succeeded.
    Hard,
    /// Sequencing only: the dependent waits, but a failure does not block it.
    Ordering,
}

impl Display for DependencyEdge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hard => Ok(()),
            Self::Ordering => f.write_str("ordering"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DagNode {
    pub spec: EntitySpec,
    /// Position in the definition, used to keep plans stable.
    pub declared_at: usize,
}

impl DagNode {
    pub fn entity_ref(&self) -> EntityRef {
        self.spec.entity_ref()
    }

    pub fn kind(&self) -> EntityKind {
        self.spec.kind()
    }
}

impl Display for DagNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.entity_ref())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanDirection {
    Apply,
    Destroy,
}

/// An entity a plan step has to wait for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requirement {
    pub entity: EntityRef,
    pub edge: DependencyEdge,
}

#[derive(Clone, Debug)]
pub struct PlanStep {
    pub spec: EntitySpec,
    pub requires: Vec<Requirement>,
}

impl PlanStep {
    pub fn entity_ref(&self) -> EntityRef {
        self.spec.entity_ref()
    }

    pub fn hard_requirements(&self) -> impl Iterator<Item = &EntityRef> {
        self.requires
            .iter()
            .filter(|r| r.edge == DependencyEdge::Hard)
            .map(|r| &r.entity)
    }
}

/// Topologically ordered operations for one direction.
#[derive(Clone, Debug)]
pub struct ProvisionPlan {
    pub direction: PlanDirection,
    pub steps: Vec<PlanStep>,
}

impl ProvisionPlan {
    pub fn entity_refs(&self) -> Vec<EntityRef> {
        self.steps.iter().map(PlanStep::entity_ref).collect()
    }

    pub fn position(&self, entity: &EntityRef) -> Option<usize> {
        self.steps.iter().position(|s| &s.entity_ref() == entity)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
