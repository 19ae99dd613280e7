//! Domain-specific error types following panic-free policy.

use thiserror::Error;

/// Errors that can occur while building domain values from user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A `host:port` token could not be parsed
    #[error("Invalid endpoint '{input}': {reason}")]
    InvalidEndpoint { input: String, reason: String },

    /// An object name is not a well-formed structured name
    #[error("Malformed object name '{name}': {reason}")]
    MalformedObjectName { name: String, reason: String },
}

impl DomainError {
    pub(crate) fn endpoint(input: &str, reason: &str) -> Self {
        Self::InvalidEndpoint {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn object_name(name: &str, reason: impl Into<String>) -> Self {
        Self::MalformedObjectName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
