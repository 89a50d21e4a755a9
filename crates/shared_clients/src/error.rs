use common::error::diagnostics::DiagnosticMessage;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteClientError {
    #[error("entity not found: {context}")]
    NotFound { context: DiagnosticMessage },
    #[error("entity already exists: {context}")]
    AlreadyExists { context: DiagnosticMessage },
    #[error("connectivity error: {context}")]
    FailedToConnect { context: DiagnosticMessage },
    #[error("request rejected: {context}")]
    Rejected { context: DiagnosticMessage },
    #[error("call timed out: {context}")]
    Timeout { context: DiagnosticMessage },
    #[error("malformed payload: {context}")]
    Serialization {
        context: DiagnosticMessage,
        #[source]
        source: serde_json::Error,
    },
    #[error("client configuration error: {context}")]
    Configuration { context: DiagnosticMessage },
    #[error("unexpected response: {context}")]
    UnexpectedError { context: DiagnosticMessage },
}

impl RemoteClientError {
    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn failed_to_connect(message: impl Into<String>) -> Self {
        Self::FailedToConnect {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedError {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    /// Map a non-success status plus the server's message to an error.
    #[track_caller]
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            StatusCode::NOT_FOUND => Self::not_found(message),
            StatusCode::CONFLICT => Self::already_exists(message),
            s if s.is_client_error() => {
                Self::rejected(format!("{message} - status code {}", s.as_u16()))
            }
            s => Self::unexpected(format!("{message} - status code {}", s.as_u16())),
        }
    }
}

impl From<reqwest::Error> for RemoteClientError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteClientError::timeout(err.to_string())
        } else if err.is_connect() {
            RemoteClientError::failed_to_connect(err.to_string())
        } else if let Some(status) = err.status() {
            RemoteClientError::from_status(status, err.to_string())
        } else {
            RemoteClientError::unexpected(format!(
                "Unexpected error trying to send remote request: {err}"
            ))
        }
    }
}

impl From<serde_json::Error> for RemoteClientError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        RemoteClientError::Serialization {
            context: DiagnosticMessage::new(source.to_string()),
            source,
        }
    }
}
