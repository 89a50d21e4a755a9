use common::error::diagnostics::DiagnosticMessage;
use common::types::EntityRef;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    DuplicateIdentifier,
    DanglingReference,
    InvalidEnumValue,
    InvalidGeometry,
    EmptyQuery,
}

impl Display for ValidationErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::DuplicateIdentifier => "duplicate identifier",
            Self::DanglingReference => "dangling reference",
            Self::InvalidEnumValue => "invalid enum value",
            Self::InvalidGeometry => "invalid geometry",
            Self::EmptyQuery => "empty query",
        };
        f.write_str(name)
    }
}

/// One structural defect in a definition.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {context}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub entity: EntityRef,
    pub context: DiagnosticMessage,
}

impl ValidationError {
    #[track_caller]
    pub fn new(kind: ValidationErrorKind, entity: EntityRef, message: impl Into<String>) -> Self {
        Self {
            context: DiagnosticMessage::for_entity(&entity, message.into()),
            kind,
            entity,
        }
    }

    pub fn message(&self) -> &str {
        self.context.message()
    }
}

/// Every defect found in a single validation pass, in check order.
#[derive(Debug, Clone)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn kinds(&self) -> Vec<ValidationErrorKind> {
        self.0.iter().map(|e| e.kind).collect()
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "definition failed validation with {} error(s):", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n - {}: {} ({})", err.entity, err.message(), err.kind)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
