//! mxr Core - Shared types for managed-object registry access
//!
//! This crate provides the domain types shared between the registry
//! client (mxr) and the reference registry server (mxrd).
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()` or `todo!()`.

pub mod attribute;
pub mod endpoint;
pub mod error;
pub mod object_name;

// Re-exports for convenience
pub use attribute::{AttributeDescriptor, AttributeValue};
pub use endpoint::{Credentials, Endpoint};
pub use error::{DomainError, DomainResult};
pub use object_name::{is_pattern, ObjectName, WILDCARD_MARKER};
