pub mod ledger;
mod reconciler;
pub mod report;
pub mod types;

pub use crate::reconciler::Reconciler;
pub use crate::report::{OutcomeEntry, OutcomeReport, OutcomeSummary};
pub use crate::types::{Action, Outcome, RunMode};
pub use tokio_util::sync::CancellationToken;

use common::error::diagnostics::DiagnosticMessage;
use common::types::EntityRef;
use thiserror::Error;

/// Failures of the reconciler itself. Remote call failures never surface here;
/// they become [`Outcome::Failed`] entries in the report.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("outcome recorded twice: {context}")]
    DuplicateOutcome { context: DiagnosticMessage },
    #[error("missing outcome: {context}")]
    MissingOutcome { context: DiagnosticMessage },
    #[error("unexpected error: {context}")]
    UnexpectedError { context: DiagnosticMessage },
}

impl ExecutorError {
    #[track_caller]
    pub fn duplicate_outcome(entity: &EntityRef) -> Self {
        Self::DuplicateOutcome {
            context: DiagnosticMessage::for_entity(entity, "already has an outcome for this run"),
        }
    }

    #[track_caller]
    pub fn missing_outcome(entity: &EntityRef) -> Self {
        Self::MissingOutcome {
            context: DiagnosticMessage::for_entity(entity, "finished without an outcome"),
        }
    }

    #[track_caller]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedError {
            context: DiagnosticMessage::new(message.into()),
        }
    }
}
