//! Registry actor commands and errors.

use mxr_core::{AttributeDescriptor, AttributeValue, ObjectName};
use mxr_protocol::ErrorCode;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::object::ManagedObject;

// ============================================================================
// Registry Commands
// ============================================================================

/// Commands sent to the registry actor.
///
/// Each command carries a oneshot channel for its response.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Register a new object.
    ///
    /// # Errors
    /// - `RegistryError::AlreadyRegistered` if the name is taken
    /// - `RegistryError::RegistryFull` at maximum capacity
    Register {
        object: Box<ManagedObject>,
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Remove an object.
    Unregister {
        name: ObjectName,
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// All registered names, in name order.
    QueryNames {
        respond_to: oneshot::Sender<Vec<String>>,
    },

    /// Attribute metadata of one object.
    GetInfo {
        name: ObjectName,
        respond_to: oneshot::Sender<Result<Vec<AttributeDescriptor>, RegistryError>>,
    },

    /// Current value of one attribute.
    GetAttribute {
        name: ObjectName,
        attribute: String,
        respond_to: oneshot::Sender<Result<AttributeValue, RegistryError>>,
    },
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("registry is full (max: {max} objects)")]
    RegistryFull { max: usize },

    #[error("object already registered: {0}")]
    AlreadyRegistered(String),

    #[error("invalid object name: {0}")]
    InvalidName(String),

    #[error("instance not found: {0}")]
    InstanceNotFound(String),

    #[error("attribute '{attribute}' not found on {name}")]
    AttributeNotFound { name: String, attribute: String },

    #[error("getter for '{attribute}' on {name} failed: {reason}")]
    GetterFailed {
        name: String,
        attribute: String,
        reason: String,
    },

    /// The actor shut down before answering.
    #[error("response channel closed")]
    ChannelClosed,
}

impl RegistryError {
    /// Wire error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidName(_) => ErrorCode::MalformedName,
            Self::InstanceNotFound(_) => ErrorCode::InstanceNotFound,
            Self::AttributeNotFound { .. } => ErrorCode::AttributeNotFound,
            Self::GetterFailed { .. } => ErrorCode::GetterFailed,
            Self::RegistryFull { .. } | Self::AlreadyRegistered(_) | Self::ChannelClosed => {
                ErrorCode::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            RegistryError::InstanceNotFound("a:b=c".into()).code(),
            ErrorCode::InstanceNotFound
        );
        assert_eq!(
            RegistryError::AttributeNotFound {
                name: "a:b=c".into(),
                attribute: "x".into()
            }
            .code(),
            ErrorCode::AttributeNotFound
        );
        assert_eq!(RegistryError::ChannelClosed.code(), ErrorCode::Internal);
    }

    #[test]
    fn test_error_display() {
        let err = RegistryError::GetterFailed {
            name: "a:b=c".into(),
            attribute: "x".into(),
            reason: "boom".into(),
        };
        assert_eq!(err.to_string(), "getter for 'x' on a:b=c failed: boom");
    }
}
