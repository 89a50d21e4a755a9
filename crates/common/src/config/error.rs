use crate::error::diagnostics::DiagnosticMessage;
use std::{error::Error as StdError, path::Path};
use thiserror::Error;

/// Failure to turn raw input into a [`DashboardDefinition`](crate::types::DashboardDefinition).
///
/// Always fatal: nothing is validated, planned or sent to the remote once the
/// definition cannot be read.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("malformed input: {context}")]
    MalformedInput {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl DefinitionError {
    #[track_caller]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            context: DiagnosticMessage::new(message.into()),
            source: None,
        }
    }

    #[track_caller]
    pub fn missing_field(entity: &str, field: &str) -> Self {
        Self::malformed(format!("{entity} is missing required field '{field}'"))
    }

    /// The definition file itself could not be read.
    #[track_caller]
    pub fn unreadable(path: &Path, err: std::io::Error) -> Self {
        Self::MalformedInput {
            context: DiagnosticMessage::new(format!(
                "could not read '{}': {err}",
                path.display()
            )),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for DefinitionError {
    #[track_caller]
    fn from(err: serde_yaml::Error) -> Self {
        DefinitionError::MalformedInput {
            context: DiagnosticMessage::new(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Problems with the provisioner's own configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("incorrect path: {context}")]
    IncorrectPath { context: DiagnosticMessage },
    #[error("parse error: {context}")]
    ParseError {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
    #[error("filesystem error: {context}")]
    PathError {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
    #[error("invalid setting: {context}")]
    InvalidSetting { context: DiagnosticMessage },
}

impl ConfigError {
    #[track_caller]
    pub fn incorrect_path(path: impl AsRef<Path>) -> Self {
        let message = format!("Expected path '{}' to exist", path.as_ref().display());
        Self::IncorrectPath {
            context: DiagnosticMessage::new(message),
        }
    }

    #[track_caller]
    pub fn invalid_setting(message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            context: DiagnosticMessage::new(message.into()),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        let message = err.to_string();
        ConfigError::PathError {
            context: DiagnosticMessage::new(message),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    #[track_caller]
    fn from(err: serde_yaml::Error) -> Self {
        let message = err.to_string();
        ConfigError::ParseError {
            context: DiagnosticMessage::new(message),
            source: Some(Box::new(err)),
        }
    }
}
