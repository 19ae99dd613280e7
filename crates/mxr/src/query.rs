//! Attribute metadata and value queries.
//!
//! The degrading entry points ([`AttributeQueryEngine::list_attributes`],
//! [`AttributeQueryEngine::get_attribute`]) never fail: each error is
//! reported once and replaced by an empty list or a fixed placeholder, so
//! callers can keep printing and polling. The `try_` variants expose the
//! underlying `Result`.

use mxr_core::{AttributeDescriptor, AttributeValue};
use tracing::debug;

use crate::connection::RegistryConnection;
use crate::error::{QueryError, Result};
use crate::resolver::ObjectResolver;

/// Returned by `get_attribute` when no connection was ever established.
pub const NO_CONNECTION: &str = "Could not create connection to host";

/// Returned by `get_attribute` when the sample failed for any other reason.
pub const UNSUPPORTED: &str = "Not supported yet";

/// Answers metadata and value queries for resolved identifiers.
pub struct AttributeQueryEngine<'c> {
    resolver: ObjectResolver<'c>,
}

impl<'c> AttributeQueryEngine<'c> {
    pub fn new(connection: &'c mut RegistryConnection) -> Self {
        Self {
            resolver: ObjectResolver::new(connection),
        }
    }

    pub fn resolver(&mut self) -> &mut ObjectResolver<'c> {
        &mut self.resolver
    }

    /// Fetches attribute metadata for an exact identifier.
    ///
    /// # Errors
    ///
    /// Parse, connect, not-found, introspection and transport errors.
    pub async fn try_list_attributes(&mut self, identifier: &str) -> Result<Vec<AttributeDescriptor>> {
        let name = ObjectResolver::try_resolve_exact(identifier)?;
        let session = self.resolver.connection().session()?;
        session.get_info(&name).await
    }

    /// Fetches attribute metadata, in registry order.
    ///
    /// Any failure is reported once and yields an empty list; a partial
    /// list is never returned.
    pub async fn list_attributes(&mut self, identifier: &str) -> Vec<AttributeDescriptor> {
        match self.try_list_attributes(identifier).await {
            Ok(attributes) => {
                debug!(object = %identifier, count = attributes.len(), "Listed attributes");
                attributes
            }
            Err(e) => {
                self.report(&e);
                Vec::new()
            }
        }
    }

    /// Fetches one attribute's current value.
    ///
    /// # Errors
    ///
    /// Parse, connect, not-found, getter and transport errors.
    pub async fn try_get_attribute(&mut self, identifier: &str, attribute: &str) -> Result<AttributeValue> {
        let name = ObjectResolver::try_resolve_exact(identifier)?;
        let session = self.resolver.connection().session()?;
        session.get_attribute(&name, attribute).await
    }

    /// Samples one attribute and renders it as text.
    ///
    /// Without a connection this returns [`NO_CONNECTION`]; the connect
    /// failure was already reported when it happened. Any other failure is
    /// reported and replaced by [`UNSUPPORTED`].
    pub async fn get_attribute(&mut self, identifier: &str, attribute: &str) -> String {
        if !self.resolver.connection().is_connected() {
            debug!(object = %identifier, attribute = %attribute, "Sample skipped: no connection");
            return NO_CONNECTION.to_string();
        }

        match self.try_get_attribute(identifier, attribute).await {
            Ok(value) => value.to_string(),
            Err(e) => {
                self.report(&e);
                UNSUPPORTED.to_string()
            }
        }
    }

    fn report(&mut self, error: &QueryError) {
        self.resolver.connection().diagnostics().report(error);
    }
}

// ============================================================================
// Tests
// ============================================================================
