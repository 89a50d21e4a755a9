use crate::types::{Outcome, RunMode};
use chrono::{DateTime, Utc};
use common::types::EntityRef;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeEntry {
    pub entity: EntityRef,
    pub outcome: Outcome,
}

/// Result of one reconcile run.
///
/// Entries follow plan order; remote-only entities found by the orphan sweep
/// come last.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeReport {
    pub mode: RunMode,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub entries: Vec<OutcomeEntry>,
    /// Problems that did not belong to a single entity, such as a failed list
    /// call during the orphan sweep.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub deleted: usize,
    pub orphaned: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub planned: usize,
}

impl OutcomeReport {
    pub fn outcome(&self, entity: &EntityRef) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|e| &e.entity == entity)
            .map(|e| &e.outcome)
    }

    pub fn entities(&self) -> Vec<&EntityRef> {
        self.entries.iter().map(|e| &e.entity).collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &OutcomeEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, Outcome::Failed { .. }))
    }

    /// True when nothing failed or was cancelled.
    pub fn is_success(&self) -> bool {
        !self.entries.iter().any(|e| e.outcome.blocks_dependents())
    }

    pub fn summary(&self) -> OutcomeSummary {
        let mut summary = OutcomeSummary::default();
        for entry in &self.entries {
            match entry.outcome {
                Outcome::Created { .. } => summary.created += 1,
                Outcome::Updated => summary.updated += 1,
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Deleted => summary.deleted += 1,
                Outcome::Orphaned => summary.orphaned += 1,
                Outcome::Failed { .. } => summary.failed += 1,
                Outcome::Cancelled => summary.cancelled += 1,
                Outcome::Planned { .. } => summary.planned += 1,
            }
        }
        summary
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
