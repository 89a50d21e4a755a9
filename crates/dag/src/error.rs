use common::diag;
use common::error::diagnostics::DiagnosticMessage;
use common::types::EntityRef;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DagError {
    #[error("duplicate node: {context}")]
    DuplicateNode { context: DiagnosticMessage },
    #[error("missing dependency: {context}")]
    MissingExpectedDependency { context: DiagnosticMessage },
    #[error("cycle detected involving: {}", format_cycle(.0))]
    CycleDetected(Vec<EntityRef>),
    #[error("I/O error: {context}")]
    Io {
        context: DiagnosticMessage,
        #[source]
        source: std::io::Error,
    },
}

fn format_cycle(nodes: &[EntityRef]) -> String {
    nodes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl DagError {
    #[track_caller]
    pub fn duplicate_node(node: &EntityRef) -> Self {
        Self::DuplicateNode {
            context: diag!("Node '{}' was declared multiple times", node),
        }
    }

    #[track_caller]
    pub fn missing_dependency(node: &EntityRef, dependency: &EntityRef) -> Self {
        Self::MissingExpectedDependency {
            context: diag!("missing deps for {}. Expecting {} to exist", node, dependency),
        }
    }

    #[track_caller]
    pub fn cycle_detected(nodes: Vec<EntityRef>) -> Self {
        Self::CycleDetected(nodes)
    }
}

impl From<std::io::Error> for DagError {
    #[track_caller]
    fn from(value: std::io::Error) -> Self {
        DagError::Io {
            context: DiagnosticMessage::new(value.to_string()),
            source: value,
        }
    }
}
