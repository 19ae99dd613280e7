//! mxr Client - query and polling engine for a managed-object registry
//!
//! # Architecture
//!
//! The engine is a chain of components, each borrowing the one below it:
//!
//! 1. **RegistryConnection**: owns the single session to the registry,
//!    created lazily and closed exactly once
//! 2. **ObjectResolver**: resolves exact names and wildcard patterns against
//!    the live registry snapshot
//! 3. **AttributeQueryEngine**: lists attribute metadata and samples values
//! 4. **PollingLoop**: samples one attribute once, or repeatedly until the
//!    shared `CancellationToken` is cancelled
//!
//! Read operations never fail outward. Each error is reported once through
//! [`Diagnostics`] and the call degrades to an empty or sentinel result, so a
//! long-running poll survives individual failed samples.

pub mod app;
pub mod cli;
pub mod connection;
pub mod diagnostics;
pub mod error;
pub mod polling;
pub mod query;
pub mod resolver;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use app::{execute, run, Request};
pub use connection::RegistryConnection;
pub use diagnostics::{Diagnostics, Reporter, TracingReporter};
pub use error::{ErrorKind, QueryError, Result};
pub use polling::{PollMode, PollingLoop};
pub use query::{AttributeQueryEngine, NO_CONNECTION, UNSUPPORTED};
pub use resolver::{first_match, NamePattern, ObjectResolver};
pub use transport::{Connector, RegistrySession, TcpConnector, TransportConfig};
