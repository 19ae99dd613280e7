//! mxr Protocol - Wire protocol for registry communication
//!
//! This crate provides the message types exchanged between registry
//! clients and a managed-object registry. Messages are JSON objects,
//! one per line, over a TCP stream.

pub mod message;
pub mod version;

pub use message::{ClientMessage, ErrorCode, RegistryMessage, RequestType, MAX_MESSAGE_SIZE};
pub use version::{ProtocolVersion, VersionError};
