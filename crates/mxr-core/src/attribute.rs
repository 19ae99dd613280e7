//! Attribute metadata and sampled values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Read-only metadata for one attribute, as reported by the registry's
/// introspection of an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    /// Attribute name, used to fetch its value
    pub name: String,

    /// Declared type, e.g. `int` or `java.lang.String`
    #[serde(rename = "type")]
    pub type_name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,
}

impl AttributeDescriptor {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            description: description.into(),
        }
    }
}

/// Renders the listing line: ` - name [type] description`.
impl fmt::Display for AttributeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " - {} [{}] {}", self.name, self.type_name, self.description)
    }
}

/// One sampled attribute value.
///
/// The value is opaque to the client; it is only ever rendered as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeValue(serde_json::Value);

impl AttributeValue {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_json(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for AttributeValue {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Default textual form: strings unquoted, everything else as compact JSON.
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}
