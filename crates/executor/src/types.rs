use dag::types::PlanDirection;
use serde::Serialize;
use shared_clients::RemoteId;
use std::fmt::{Display, Formatter};

/// What reconciliation decided to do with one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
    Skip,
    Delete,
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Skip => "skip",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Created { remote_id: RemoteId },
    Updated,
    Skipped,
    Deleted,
    /// Present on the remote but not declared, and left alone.
    Orphaned,
    Failed { reason: String },
    /// Never started because the run was cancelled.
    Cancelled,
    /// Dry run: the action that would have been taken.
    Planned { action: Action },
}

impl Outcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Dependents with a hard requirement on this entity must not run.
    pub fn blocks_dependents(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Cancelled)
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created { remote_id } => write!(f, "created ({remote_id})"),
            Self::Updated => f.write_str("updated"),
            Self::Skipped => f.write_str("skipped"),
            Self::Deleted => f.write_str("deleted"),
            Self::Orphaned => f.write_str("orphaned"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Planned { action } => write!(f, "planned {action}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Apply,
    Destroy,
}

impl From<PlanDirection> for RunMode {
    fn from(value: PlanDirection) -> Self {
        match value {
            PlanDirection::Apply => Self::Apply,
            PlanDirection::Destroy => Self::Destroy,
        }
    }
}
