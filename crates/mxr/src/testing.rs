//! In-memory registry and recording reporter for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mxr_core::{
    AttributeDescriptor, AttributeValue, Credentials, Endpoint, ObjectName,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::connection::RegistryConnection;
use crate::diagnostics::{Diagnostics, Reporter};
use crate::error::{ErrorKind, QueryError, Result};
use crate::transport::{Connector, RegistrySession};

// ============================================================================
// Recording Reporter
// ============================================================================

#[derive(Default)]
struct Recorded {
    errors: Vec<ErrorKind>,
    notices: Vec<String>,
}

/// Reporter that remembers what it was given.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingReporter {
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(self.clone())
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.inner.lock().unwrap().errors.clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.inner.lock().unwrap().notices.clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, error: &QueryError) {
        self.inner.lock().unwrap().errors.push(error.kind());
    }

    fn notice(&self, message: &str) {
        self.inner.lock().unwrap().notices.push(message.to_string());
    }
}

// ============================================================================
// Fake Registry
// ============================================================================

struct FakeAttribute {
    descriptor: AttributeDescriptor,
    /// `None` makes the getter fail
    value: Option<Value>,
}

struct FakeObject {
    name: String,
    attributes: Vec<FakeAttribute>,
}

#[derive(Default)]
struct RegistryState {
    objects: Vec<FakeObject>,
    connects: usize,
    closes: usize,
    listings: usize,
    samples: usize,
    refuse_connect: bool,
    drop_requests: bool,
    fail_close: bool,
    cancel_after: Option<(usize, CancellationToken)>,
}

/// Registry held in memory, shared by every session it hands out.
#[derive(Clone, Default)]
pub struct FakeRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl FakeRegistry {
    /// Registers an object with `(name, type, value)` attributes.
    pub fn with_object(self, name: &str, attributes: &[(&str, &str, Value)]) -> Self {
        let attributes = attributes
            .iter()
            .map(|(attr, type_name, value)| FakeAttribute {
                descriptor: AttributeDescriptor::new(*attr, *type_name, format!("The {attr}")),
                value: Some(value.clone()),
            })
            .collect();
        self.state.lock().unwrap().objects.push(FakeObject {
            name: name.to_string(),
            attributes,
        });
        self
    }

    /// Adds an attribute whose getter always fails.
    pub fn with_failing_attribute(self, name: &str, attribute: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let object = state.objects.iter_mut().find(|o| o.name == name).unwrap();
            object.attributes.push(FakeAttribute {
                descriptor: AttributeDescriptor::new(attribute, "int", "Always fails"),
                value: None,
            });
        }
        self
    }

    pub fn refuse_connections(self) -> Self {
        self.state.lock().unwrap().refuse_connect = true;
        self
    }

    pub fn fail_close(self) -> Self {
        self.state.lock().unwrap().fail_close = true;
        self
    }

    /// Cancels `token` once this many values have been sampled.
    pub fn cancel_after(self, samples: usize, token: CancellationToken) -> Self {
        self.state.lock().unwrap().cancel_after = Some((samples, token));
        self
    }

    /// Makes every subsequent request fail as if the stream dropped.
    pub fn drop_requests(&self) {
        self.state.lock().unwrap().drop_requests = true;
    }

    pub fn set_value(&self, name: &str, attribute: &str, value: Value) {
        let mut state = self.state.lock().unwrap();
        let object = state.objects.iter_mut().find(|o| o.name == name).unwrap();
        let attr = object
            .attributes
            .iter_mut()
            .find(|a| a.descriptor.name == attribute)
            .unwrap();
        attr.value = Some(value);
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    /// Number of `query_names` calls served.
    pub fn listings(&self) -> usize {
        self.state.lock().unwrap().listings
    }

    pub fn samples(&self) -> usize {
        self.state.lock().unwrap().samples
    }
}

#[async_trait]
impl Connector for FakeRegistry {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        _credentials: &Credentials,
    ) -> Result<Box<dyn RegistrySession>> {
        let mut state = self.state.lock().unwrap();
        if state.refuse_connect {
            return Err(QueryError::ConnectFailed {
                endpoint: endpoint.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        state.connects += 1;
        Ok(Box::new(FakeSession {
            registry: self.clone(),
            connection_id: format!("fake-{}", state.connects),
        }))
    }
}

struct FakeSession {
    registry: FakeRegistry,
    connection_id: String,
}

impl FakeSession {
    fn check_link(state: &RegistryState) -> Result<()> {
        if state.drop_requests {
            Err(QueryError::ConnectionLost)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RegistrySession for FakeSession {
    fn connection_id(&self) -> &str {
        &self.connection_id
    }

    async fn query_names(&mut self) -> Result<Vec<String>> {
        let mut state = self.registry.state.lock().unwrap();
        Self::check_link(&state)?;
        state.listings += 1;
        Ok(state.objects.iter().map(|o| o.name.clone()).collect())
    }

    async fn get_info(&mut self, name: &ObjectName) -> Result<Vec<AttributeDescriptor>> {
        let state = self.registry.state.lock().unwrap();
        Self::check_link(&state)?;
        let name = name.to_string();
        let object = state
            .objects
            .iter()
            .find(|o| o.name == name)
            .ok_or(QueryError::InstanceNotFound { name })?;
        Ok(object.attributes.iter().map(|a| a.descriptor.clone()).collect())
    }

    async fn get_attribute(&mut self, name: &ObjectName, attribute: &str) -> Result<AttributeValue> {
        let mut state = self.registry.state.lock().unwrap();
        Self::check_link(&state)?;
        let name = name.to_string();

        let value = {
            let object = state
                .objects
                .iter()
                .find(|o| o.name == name)
                .ok_or_else(|| QueryError::InstanceNotFound { name: name.clone() })?;
            let attr = object
                .attributes
                .iter()
                .find(|a| a.descriptor.name == attribute)
                .ok_or_else(|| QueryError::AttributeNotFound {
                    name: name.clone(),
                    attribute: attribute.to_string(),
                })?;
            attr.value.clone().ok_or_else(|| QueryError::Getter {
                name: name.clone(),
                attribute: attribute.to_string(),
                reason: "getter failed".to_string(),
            })?
        };

        state.samples += 1;
        if let Some((limit, token)) = &state.cancel_after {
            if state.samples >= *limit {
                token.cancel();
            }
        }
        Ok(AttributeValue::new(value))
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.registry.state.lock().unwrap();
        state.closes += 1;
        if state.fail_close {
            return Err(QueryError::ConnectionLost);
        }
        Ok(())
    }
}

/// Builds an unconnected `RegistryConnection` backed by `registry`.
pub fn connection(registry: &FakeRegistry, reporter: &RecordingReporter) -> RegistryConnection {
    RegistryConnection::new(
        Endpoint::new("registry.test", 9875),
        Credentials::new("monitor", "secret"),
        registry.clone(),
        reporter.diagnostics(),
    )
}
