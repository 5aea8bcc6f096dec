//! Error types for the messaging crate.

use std::fmt;

/// Errors from delivering or acknowledging chat messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The HTTP request could not be built or completed.
    Request { method: String, reason: String },
    /// The messaging API answered but refused the call.
    Rejected {
        method: String,
        error_code: Option<i64>,
        description: String,
    },
    /// The response body was not the expected envelope.
    InvalidResponse { method: String, reason: String },
    /// The transport could not be constructed.
    Setup { reason: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request { method, reason } => {
                write!(f, "{method} request failed: {reason}")
            }
            Self::Rejected {
                method,
                error_code: Some(code),
                description,
            } => {
                write!(f, "{method} rejected ({code}): {description}")
            }
            Self::Rejected {
                method,
                error_code: None,
                description,
            } => {
                write!(f, "{method} rejected: {description}")
            }
            Self::InvalidResponse { method, reason } => {
                write!(f, "invalid {method} response: {reason}")
            }
            Self::Setup { reason } => write!(f, "transport setup failed: {reason}"),
        }
    }
}

impl std::error::Error for TransportError {}
