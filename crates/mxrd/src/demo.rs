//! Demo objects registered by the `mxrd` binary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use mxr_core::ObjectName;
use mxr_protocol::ProtocolVersion;
use serde_json::json;

use crate::object::ManagedObject;
use crate::registry::{RegistryError, RegistryHandle};

pub const RUNTIME_NAME: &str = "mxrd:type=Runtime";
pub const POOL_NAME: &str = "mxrd:type=Pool,name=default";
pub const CACHE_NAME: &str = "mxrd:type=Cache,name=default";

fn demo_name(name: &str) -> Result<ObjectName, RegistryError> {
    ObjectName::parse(name).map_err(|e| RegistryError::InvalidName(e.to_string()))
}

fn runtime() -> Result<ManagedObject, RegistryError> {
    let started = Instant::now();
    let start_time = Utc::now().to_rfc3339();
    let processors = std::thread::available_parallelism().map_or(1, |n| n.get());

    Ok(ManagedObject::new(demo_name(RUNTIME_NAME)?)
        .with_computed("Uptime", "long", "Milliseconds since the server started", move || {
            let millis = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            Ok(json!(millis))
        })
        .with_static("StartTime", "java.lang.String", "Server start time (RFC 3339)", json!(start_time))
        .with_static(
            "ProtocolVersion",
            "java.lang.String",
            "Wire protocol version",
            json!(ProtocolVersion::CURRENT.to_string()),
        )
        .with_static("AvailableProcessors", "int", "Processors available to the server", json!(processors)))
}

fn pool() -> Result<ManagedObject, RegistryError> {
    let busy = Arc::new(AtomicU64::new(0));

    Ok(ManagedObject::new(demo_name(POOL_NAME)?)
        .with_static("size", "int", "Open connections", json!(42))
        .with_computed("numBusyConnections", "int", "Connections in use", move || {
            // Cycles 0..8 so repeated samples change
            Ok(json!(busy.fetch_add(1, Ordering::Relaxed) % 8))
        })
        .with_static("maxSize", "int", "Upper bound on open connections", json!(64)))
}

fn cache() -> Result<ManagedObject, RegistryError> {
    Ok(ManagedObject::new(demo_name(CACHE_NAME)?)
        .with_static("hitRatio", "double", "Fraction of lookups served from cache", json!(0.93))
        .with_static("entries", "long", "Cached entries", json!(1024))
        .with_static("evictionPolicy", "java.lang.String", "Eviction strategy", json!("LRU"))
        .with_computed("lastError", "java.lang.String", "Most recent failure", || {
            Err("no error has been recorded".to_string())
        }))
}

/// Registers the demo objects.
///
/// # Errors
///
/// The first registration failure.
pub async fn register_demo_objects(registry: &RegistryHandle) -> Result<(), RegistryError> {
    for object in [runtime()?, pool()?, cache()?] {
        registry.register(object).await?;
    }
    Ok(())
}
