//! Protocol message types for registry communication.

use crate::version::ProtocolVersion;
use mxr_core::{AttributeDescriptor, AttributeValue, Credentials};
use serde::{Deserialize, Serialize};

/// Maximum size of a single encoded message (1 MiB), enforced by both sides.
pub const MAX_MESSAGE_SIZE: usize = 1_048_576;

/// Requests a client can send to the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestType {
    /// Handshake; must be the first message on a connection
    Connect {
        /// Static credential pair (password redacted in `Debug`)
        credentials: Credentials,
    },

    /// Request the identifiers of every registered object
    QueryNames,

    /// Request attribute metadata for one object
    GetInfo {
        /// Exact object name
        object_name: String,
    },

    /// Request the current value of one attribute
    GetAttribute {
        /// Exact object name
        object_name: String,
        /// Attribute to sample
        attribute: String,
    },

    /// Client closing the session
    Disconnect,
}

/// Messages sent from client to registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessage {
    /// Protocol version
    pub protocol_version: ProtocolVersion,

    /// Message payload
    #[serde(flatten)]
    pub message: RequestType,
}

impl ClientMessage {
    /// Creates a new client message with current protocol version.
    pub fn new(message: RequestType) -> Self {
        Self {
            protocol_version: ProtocolVersion::CURRENT,
            message,
        }
    }

    pub fn connect(credentials: Credentials) -> Self {
        Self::new(RequestType::Connect { credentials })
    }

    pub fn query_names() -> Self {
        Self::new(RequestType::QueryNames)
    }

    pub fn get_info(object_name: impl Into<String>) -> Self {
        Self::new(RequestType::GetInfo {
            object_name: object_name.into(),
        })
    }

    pub fn get_attribute(object_name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::new(RequestType::GetAttribute {
            object_name: object_name.into(),
            attribute: attribute.into(),
        })
    }

    pub fn disconnect() -> Self {
        Self::new(RequestType::Disconnect)
    }
}

/// Failure categories a registry can report for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// No object is registered under the name
    InstanceNotFound,
    /// The object has no attribute of that name
    AttributeNotFound,
    /// The name in the request is not a well-formed object name
    MalformedName,
    /// The object's metadata could not be produced
    IntrospectionFailed,
    /// The attribute getter raised an error
    GetterFailed,
    /// Request sent before a successful handshake
    Unauthorized,
    /// Request type not supported by this registry
    Unsupported,
    /// Anything else
    Internal,
}

/// Messages sent from registry to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryMessage {
    /// Handshake accepted
    Connected {
        /// Registry's protocol version
        protocol_version: ProtocolVersion,
        /// Identifier of this session, for diagnostics
        connection_id: String,
    },

    /// Handshake refused (bad credentials, version mismatch)
    Rejected {
        /// Reason for rejection
        reason: String,
        /// Registry's protocol version
        protocol_version: ProtocolVersion,
    },

    /// Response to `query_names`
    Names {
        /// Every registered identifier, in registry order
        names: Vec<String>,
    },

    /// Response to `get_info`
    Info {
        object_name: String,
        /// Declared attributes, in registry order
        attributes: Vec<AttributeDescriptor>,
    },

    /// Response to `get_attribute`
    Value {
        object_name: String,
        attribute: String,
        value: AttributeValue,
    },

    /// Request failed
    Error {
        code: ErrorCode,
        message: String,
    },
}

impl RegistryMessage {
    pub fn connected(connection_id: impl Into<String>) -> Self {
        Self::Connected {
            protocol_version: ProtocolVersion::CURRENT,
            connection_id: connection_id.into(),
        }
    }

    pub fn rejected(reason: &str) -> Self {
        Self::Rejected {
            reason: reason.to_string(),
            protocol_version: ProtocolVersion::CURRENT,
        }
    }

    pub fn names(names: Vec<String>) -> Self {
        Self::Names { names }
    }

    pub fn info(object_name: impl Into<String>, attributes: Vec<AttributeDescriptor>) -> Self {
        Self::Info {
            object_name: object_name.into(),
            attributes,
        }
    }

    pub fn value(
        object_name: impl Into<String>,
        attribute: impl Into<String>,
        value: AttributeValue,
    ) -> Self {
        Self::Value {
            object_name: object_name.into(),
            attribute: attribute.into(),
            value,
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    /// Short name of the message type, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Rejected { .. } => "rejected",
            Self::Names { .. } => "names",
            Self::Info { .. } => "info",
            Self::Value { .. } => "value",
            Self::Error { .. } => "error",
        }
    }
}
