//! Error type for device API operations.
//!
//! # Design
//! Callers render `details` (and `code` when the backend supplied one), so a
//! single error type covers every failure. `kind` keeps the taxonomy
//! available for callers that need to branch, e.g. the shutdown override
//! that accepts a lost connection as success.

use crate::http::{TransportError, TransportErrorKind};

/// Which stage of an operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a response.
    Transport(TransportErrorKind),

    /// Wrong content type or a body that is not valid JSON.
    MalformedResponse,

    /// Well-formed response that signals a logical failure.
    Backend,

    /// A successful envelope lacks (or mistypes) the field the operation
    /// returns.
    MissingField,

    /// The request payload could not be serialized to JSON.
    Serialization,

    /// The anti-forgery token could not be read or refreshed.
    Csrf,
}

/// The error surfaced by every operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{details}")]
pub struct OperationError {
    pub details: String,
    pub code: Option<String>,
    pub kind: ErrorKind,
}

impl OperationError {
    pub fn new(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            details: details.into(),
            code: None,
            kind,
        }
    }

    pub fn backend(details: impl Into<String>, code: Option<String>) -> Self {
        Self {
            details: details.into(),
            code,
            kind: ErrorKind::Backend,
        }
    }

    pub fn malformed(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, details)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorKind::MissingField, format!("Missing expected {field} field"))
    }

    pub fn unexpected_type(field: &str) -> Self {
        Self::new(ErrorKind::MissingField, format!("Unexpected type for {field} field"))
    }

    pub fn serialization(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::Serialization, err.to_string())
    }

    pub fn csrf(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::Csrf, details)
    }

    /// True when the failure is the transport losing its connection.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport(TransportErrorKind::ConnectionLost))
    }
}

impl From<TransportError> for OperationError {
    fn from(err: TransportError) -> Self {
        let kind = if err.is_connection_lost() {
            TransportErrorKind::ConnectionLost
        } else {
            err.kind
        };
        Self::new(ErrorKind::Transport(kind), err.message)
    }
}
