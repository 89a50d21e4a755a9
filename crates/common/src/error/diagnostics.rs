use crate::types::EntityRef;
use std::{borrow::Cow, fmt, panic::Location};

/// Error message that remembers where it was raised and, when it concerns a
/// single entity, which one.
///
/// Build one with [`DiagnosticMessage::new`], [`DiagnosticMessage::for_entity`]
/// or the [`diag!`] macro, which takes `format!` arguments
/// (e.g. `diag!("dataset {} missing", id)`).
#[derive(Clone, Debug)]
pub struct DiagnosticMessage {
    message: Cow<'static, str>,
    entity: Option<EntityRef>,
    location: &'static Location<'static>,
}

impl DiagnosticMessage {
    #[track_caller]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            entity: None,
            location: Location::caller(),
        }
    }

    /// A message about `entity`; rendered as `[kind/id] message`.
    #[track_caller]
    pub fn for_entity(entity: &EntityRef, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            entity: Some(entity.clone()),
            location: Location::caller(),
        }
    }

    /// The message without the entity prefix or location suffix.
    pub fn message(&self) -> &str {
        self.message.as_ref()
    }

    pub fn entity(&self) -> Option<&EntityRef> {
        self.entity.as_ref()
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(entity) = &self.entity {
            write!(f, "[{entity}] ")?;
        }
        write!(
            f,
            "{} (at {}:{})",
            self.message,
            self.location.file(),
            self.location.line()
        )
    }
}

/// Build a [`DiagnosticMessage`] with `format!` syntax, capturing file/line.
#[macro_export]
macro_rules! diag {
    ($msg:literal $(,)?) => {
        $crate::error::diagnostics::DiagnosticMessage::new($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::diagnostics::DiagnosticMessage::new(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityKind;

    #[test]
    fn records_call_site() {
        let diag = DiagnosticMessage::new("definition has no datasets");
        assert_eq!(diag.message(), "definition has no datasets");
        assert!(diag.entity().is_none());
        assert!(diag.location().file().ends_with("diagnostics.rs"));
        assert!(diag.to_string().starts_with("definition has no datasets (at "));
    }

    #[test]
    fn entity_prefixes_the_rendered_message() {
        let sales = EntityRef::new(EntityKind::Dataset, "sales");
        let diag = DiagnosticMessage::for_entity(&sales, "query is empty");
        assert_eq!(diag.message(), "query is empty");
        assert_eq!(diag.entity(), Some(&sales));
        assert!(diag.to_string().starts_with("[dataset/sales] query is empty (at "));
    }

    #[test]
    fn macro_formats_arguments() {
        let diag = diag!("visual {} references {}", "kpi_total", "missing");
        assert_eq!(diag.message(), "visual kpi_total references missing");
    }
}
