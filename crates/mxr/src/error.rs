//! Error types for registry queries.
//!
//! Every failure the engine can hit is a [`QueryError`]. Errors are grouped
//! into a small taxonomy ([`ErrorKind`]) that decides how they surface:
//! only `Config` errors stop the process, everything else is reported to the
//! diagnostic stream and degraded to an empty or sentinel result.
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::fmt;
use std::io;
use std::time::Duration;

use mxr_core::DomainError;
use mxr_protocol::ErrorCode;
use thiserror::Error;

// ============================================================================
// Error Kind
// ============================================================================

/// Failure classes of the query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed endpoint or missing argument; fatal
    Config,
    /// Could not establish the connection, or none exists
    Connect,
    /// Malformed object identifier or pattern
    Parse,
    /// Object or attribute absent in the registry
    NotFound,
    /// I/O or remote failure during an established session
    Transport,
    /// Failure releasing the connection at teardown
    Close,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config => "config",
            Self::Connect => "connect",
            Self::Parse => "parse",
            Self::NotFound => "not_found",
            Self::Transport => "transport",
            Self::Close => "close",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Query Error
// ============================================================================

/// Errors raised while talking to a registry.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Invalid or incomplete command-line configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Invalid endpoint or object name.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The transport could not reach or handshake with the registry.
    #[error("Could not connect to {endpoint}: {reason}")]
    ConnectFailed { endpoint: String, reason: String },

    /// The registry refused the handshake (credentials, protocol version).
    #[error("Registry at {endpoint} rejected the connection: {reason}")]
    Rejected { endpoint: String, reason: String },

    /// An operation needed a connection but none was established.
    #[error("No connection to the registry")]
    NotConnected,

    /// A wildcard identifier is not a valid pattern.
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// No object is registered under the name.
    #[error("Instance not found: {name}")]
    InstanceNotFound { name: String },

    /// The object exists but has no such attribute.
    #[error("Attribute '{attribute}' not found on {name}")]
    AttributeNotFound { name: String, attribute: String },

    /// The registry could not describe the object.
    #[error("Introspection of {name} failed: {reason}")]
    Introspection { name: String, reason: String },

    /// The attribute getter raised an error on the registry side.
    #[error("Reading '{attribute}' on {name} failed: {reason}")]
    Getter {
        name: String,
        attribute: String,
        reason: String,
    },

    /// Any other error reported by the registry.
    #[error("Registry error ({code:?}): {message}")]
    Remote { code: ErrorCode, message: String },

    /// Unexpected or oversized message.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// No response within the request timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The registry closed the stream mid-session.
    #[error("Registry closed the connection")]
    ConnectionLost,

    /// I/O error passthrough.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parse error passthrough.
    #[error("Failed to parse message: {0}")]
    Json(#[from] serde_json::Error),

    /// Releasing the connection failed.
    #[error("Could not close connection {connection_id}: {reason}")]
    Close {
        connection_id: String,
        reason: String,
    },
}

impl QueryError {
    /// Taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Domain(DomainError::InvalidEndpoint { .. }) => ErrorKind::Config,
            Self::Domain(DomainError::MalformedObjectName { .. }) => ErrorKind::Parse,
            Self::ConnectFailed { .. } | Self::Rejected { .. } | Self::NotConnected => {
                ErrorKind::Connect
            }
            Self::InvalidPattern { .. } => ErrorKind::Parse,
            Self::InstanceNotFound { .. } | Self::AttributeNotFound { .. } => ErrorKind::NotFound,
            Self::Introspection { .. }
            | Self::Getter { .. }
            | Self::Remote { .. }
            | Self::Protocol(_)
            | Self::Timeout(_)
            | Self::ConnectionLost
            | Self::Io(_)
            | Self::Json(_) => ErrorKind::Transport,
            Self::Close { .. } => ErrorKind::Close,
        }
    }

    /// Maps an error response from the registry onto the local taxonomy.
    ///
    /// `name` and `attribute` describe the request that failed.
    pub fn from_remote(code: ErrorCode, message: String, name: &str, attribute: &str) -> Self {
        match code {
            ErrorCode::InstanceNotFound => Self::InstanceNotFound {
                name: name.to_string(),
            },
            ErrorCode::AttributeNotFound => Self::AttributeNotFound {
                name: name.to_string(),
                attribute: attribute.to_string(),
            },
            ErrorCode::MalformedName => Self::Domain(DomainError::MalformedObjectName {
                name: name.to_string(),
                reason: message,
            }),
            ErrorCode::IntrospectionFailed => Self::Introspection {
                name: name.to_string(),
                reason: message,
            },
            ErrorCode::GetterFailed => Self::Getter {
                name: name.to_string(),
                attribute: attribute.to_string(),
                reason: message,
            },
            ErrorCode::Unauthorized | ErrorCode::Unsupported | ErrorCode::Internal => {
                Self::Remote { code, message }
            }
        }
    }
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Convenience Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;

// ============================================================================
// Tests
// ============================================================================
