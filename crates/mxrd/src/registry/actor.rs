//! Registry actor - owns every managed object and processes commands.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Response send failures are ignored; the requester may have gone away

use std::collections::BTreeMap;

use mxr_core::{AttributeDescriptor, AttributeValue, ObjectName};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::commands::{RegistryCommand, RegistryError};
use crate::object::ManagedObject;

/// Maximum number of objects the registry can hold.
pub const MAX_OBJECTS: usize = 1000;

/// The registry actor.
///
/// Runs in a single task and processes commands sequentially, so all state
/// mutations happen in one place. Objects are keyed by their canonical name
/// string, which also fixes the order `QueryNames` reports.
pub struct RegistryActor {
    receiver: mpsc::Receiver<RegistryCommand>,
    objects: BTreeMap<String, ManagedObject>,
}

impl RegistryActor {
    pub fn new(receiver: mpsc::Receiver<RegistryCommand>) -> Self {
        Self {
            receiver,
            objects: BTreeMap::new(),
        }
    }

    /// Processes commands until every sender is dropped.
    pub async fn run(mut self) {
        info!("Registry actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(objects = self.objects.len(), "Registry actor stopped");
    }

    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Register { object, respond_to } => {
                let _ = respond_to.send(self.handle_register(*object));
            }
            RegistryCommand::Unregister { name, respond_to } => {
                let _ = respond_to.send(self.handle_unregister(&name));
            }
            RegistryCommand::QueryNames { respond_to } => {
                let _ = respond_to.send(self.objects.keys().cloned().collect());
            }
            RegistryCommand::GetInfo { name, respond_to } => {
                let _ = respond_to.send(self.handle_get_info(&name));
            }
            RegistryCommand::GetAttribute {
                name,
                attribute,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_get_attribute(&name, &attribute));
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    fn handle_register(&mut self, object: ManagedObject) -> Result<(), RegistryError> {
        let key = object.name().to_string();

        if self.objects.contains_key(&key) {
            debug!(object = %key, "Object already registered, rejecting");
            return Err(RegistryError::AlreadyRegistered(key));
        }
        if self.objects.len() >= MAX_OBJECTS {
            warn!(
                object = %key,
                max = MAX_OBJECTS,
                "Registry is full, rejecting registration"
            );
            return Err(RegistryError::RegistryFull { max: MAX_OBJECTS });
        }

        self.objects.insert(key.clone(), object);
        info!(object = %key, total_objects = self.objects.len(), "Object registered");
        Ok(())
    }

    fn handle_unregister(&mut self, name: &ObjectName) -> Result<(), RegistryError> {
        let key = name.to_string();
        match self.objects.remove(&key) {
            Some(_) => {
                info!(object = %key, total_objects = self.objects.len(), "Object unregistered");
                Ok(())
            }
            None => Err(RegistryError::InstanceNotFound(key)),
        }
    }

    fn lookup(&self, name: &ObjectName) -> Result<&ManagedObject, RegistryError> {
        let key = name.to_string();
        self.objects
            .get(&key)
            .ok_or(RegistryError::InstanceNotFound(key))
    }

    fn handle_get_info(&self, name: &ObjectName) -> Result<Vec<AttributeDescriptor>, RegistryError> {
        Ok(self.lookup(name)?.descriptors())
    }

    fn handle_get_attribute(
        &self,
        name: &ObjectName,
        attribute: &str,
    ) -> Result<AttributeValue, RegistryError> {
        let object = self.lookup(name)?;
        let attr = object
            .attribute(attribute)
            .ok_or_else(|| RegistryError::AttributeNotFound {
                name: name.to_string(),
                attribute: attribute.to_string(),
            })?;

        attr.source.read().map_err(|reason| {
            debug!(object = %name, attribute = %attribute, reason = %reason, "Getter failed");
            RegistryError::GetterFailed {
                name: name.to_string(),
                attribute: attribute.to_string(),
                reason,
            }
        })
    }

    #[cfg(test)]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}
