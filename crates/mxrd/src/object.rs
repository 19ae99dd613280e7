//! Managed objects held by the registry.

use std::fmt;
use std::sync::Arc;

use mxr_core::{AttributeDescriptor, AttributeValue, ObjectName};
use serde_json::Value;

/// Getter invoked on every read of a computed attribute.
pub type Getter = Arc<dyn Fn() -> Result<Value, String> + Send + Sync>;

/// Where an attribute's value comes from.
#[derive(Clone)]
pub enum AttributeSource {
    /// Fixed value set at registration
    Static(Value),
    /// Value produced on each read
    Computed(Getter),
}

impl AttributeSource {
    /// Reads the current value.
    ///
    /// # Errors
    ///
    /// The getter's message when a computed attribute fails.
    pub fn read(&self) -> Result<AttributeValue, String> {
        match self {
            Self::Static(value) => Ok(AttributeValue::new(value.clone())),
            Self::Computed(getter) => getter().map(AttributeValue::new),
        }
    }
}

impl fmt::Debug for AttributeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// One attribute: its metadata and value source.
#[derive(Debug, Clone)]
pub struct ManagedAttribute {
    pub descriptor: AttributeDescriptor,
    pub source: AttributeSource,
}

/// An object registered under a unique name.
#[derive(Debug, Clone)]
pub struct ManagedObject {
    name: ObjectName,
    attributes: Vec<ManagedAttribute>,
}

impl ManagedObject {
    pub fn new(name: ObjectName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute with a fixed value.
    #[must_use]
    pub fn with_static(
        mut self,
        name: &str,
        type_name: &str,
        description: &str,
        value: Value,
    ) -> Self {
        self.attributes.push(ManagedAttribute {
            descriptor: AttributeDescriptor::new(name, type_name, description),
            source: AttributeSource::Static(value),
        });
        self
    }

    /// Adds an attribute computed on every read.
    #[must_use]
    pub fn with_computed<F>(mut self, name: &str, type_name: &str, description: &str, getter: F) -> Self
    where
        F: Fn() -> Result<Value, String> + Send + Sync + 'static,
    {
        self.attributes.push(ManagedAttribute {
            descriptor: AttributeDescriptor::new(name, type_name, description),
            source: AttributeSource::Computed(Arc::new(getter)),
        });
        self
    }

    pub fn name(&self) -> &ObjectName {
        &self.name
    }

    /// Attribute metadata in registration order.
    pub fn descriptors(&self) -> Vec<AttributeDescriptor> {
        self.attributes.iter().map(|a| a.descriptor.clone()).collect()
    }

    pub fn attribute(&self, name: &str) -> Option<&ManagedAttribute> {
        self.attributes.iter().find(|a| a.descriptor.name == name)
    }
}
