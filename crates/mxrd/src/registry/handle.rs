//! Client interface for the registry actor.
//!
//! Channel failures are mapped to `RegistryError::ChannelClosed`.

use mxr_core::{AttributeDescriptor, AttributeValue, ObjectName};
use tokio::sync::{mpsc, oneshot};

use super::commands::{RegistryCommand, RegistryError};
use crate::object::ManagedObject;

/// Cheap-to-clone handle shared by every connection task.
#[derive(Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    pub fn new(sender: mpsc::Sender<RegistryCommand>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RegistryCommand,
    ) -> Result<T, RegistryError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(command(tx))
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;
        rx.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Registers a new object.
    ///
    /// # Errors
    ///
    /// - `RegistryError::AlreadyRegistered` if the name is taken
    /// - `RegistryError::RegistryFull` at capacity
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn register(&self, object: ManagedObject) -> Result<(), RegistryError> {
        self.request(|respond_to| RegistryCommand::Register {
            object: Box::new(object),
            respond_to,
        })
        .await?
    }

    /// Removes an object.
    ///
    /// # Errors
    ///
    /// `RegistryError::InstanceNotFound` or `RegistryError::ChannelClosed`.
    pub async fn unregister(&self, name: ObjectName) -> Result<(), RegistryError> {
        self.request(|respond_to| RegistryCommand::Unregister { name, respond_to })
            .await?
    }

    /// Every registered name.
    ///
    /// # Errors
    ///
    /// `RegistryError::ChannelClosed` if the actor has shut down.
    pub async fn query_names(&self) -> Result<Vec<String>, RegistryError> {
        self.request(|respond_to| RegistryCommand::QueryNames { respond_to })
            .await
    }

    pub async fn get_info(&self, name: ObjectName) -> Result<Vec<AttributeDescriptor>, RegistryError> {
        self.request(|respond_to| RegistryCommand::GetInfo { name, respond_to })
            .await?
    }

    pub async fn get_attribute(
        &self,
        name: ObjectName,
        attribute: impl Into<String>,
    ) -> Result<AttributeValue, RegistryError> {
        let attribute = attribute.into();
        self.request(|respond_to| RegistryCommand::GetAttribute {
            name,
            attribute,
            respond_to,
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closed_actor_maps_to_channel_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = RegistryHandle::new(tx);

        assert_eq!(handle.query_names().await, Err(RegistryError::ChannelClosed));
    }
}
