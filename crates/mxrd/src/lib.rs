//! mxrd - reference managed-object registry server
//!
//! - `object` - managed objects and their attribute sources
//! - `registry` - registry actor owning every object
//! - `server` - TCP server speaking the mxr protocol
//! - `demo` - sample objects served by the binary
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                        mxrd                           │
//! ├───────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐      ┌─────────────────────┐     │
//! │  │ RegistryServer  │─────▶│    RegistryActor    │     │
//! │  │ (TcpListener)   │      │ (object state owner)│     │
//! │  └────────┬────────┘      └─────────────────────┘     │
//! │           │ connections                               │
//! │           ▼                                           │
//! │  ┌─────────────────┐                                  │
//! │  │ConnectionHandler│                                  │
//! │  │  (per client)   │                                  │
//! │  └─────────────────┘                                  │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! Production code never calls `.unwrap()`, `.expect()` or `panic!()`.
//! Channel operations handle closure gracefully.

pub mod demo;
pub mod object;
pub mod registry;
pub mod server;

pub use object::{AttributeSource, ManagedAttribute, ManagedObject};
pub use registry::{spawn_registry, RegistryError, RegistryHandle};
pub use server::{RegistryServer, ServerError, DEFAULT_LISTEN_ADDR};
