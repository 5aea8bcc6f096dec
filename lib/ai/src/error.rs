//! Error types for the AI crate.

use crate::backend::AiProvider;
use std::fmt;

/// Errors from text generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// Provider is unreachable or returned a server error.
    ProviderUnavailable { provider: AiProvider, reason: String },
    /// Provider refused the request (bad key, quota, content policy).
    RequestFailed { provider: AiProvider, reason: String },
    /// The node config cannot produce a valid request.
    InvalidConfig { reason: String },
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "{provider} unavailable: {reason}")
            }
            Self::RequestFailed { provider, reason } => {
                write!(f, "{provider} request failed: {reason}")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid generation config: {reason}")
            }
        }
    }
}

impl std::error::Error for GenerateError {}
