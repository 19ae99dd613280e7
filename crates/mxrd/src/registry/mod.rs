//! Managed-object registry using the actor pattern.
//!
//! ```text
//! ┌───────────────────┐  RegistryCommand   ┌─────────────────┐
//! │ ConnectionHandler │───(mpsc channel)──▶│  RegistryActor  │
//! │   (per client)    │◀──(oneshot reply)──│ BTreeMap<name,  │
//! └───────────────────┘                    │  ManagedObject> │
//!                                          └─────────────────┘
//! ```

use tokio::sync::mpsc;

mod actor;
mod commands;
mod handle;

pub use actor::{RegistryActor, MAX_OBJECTS};
pub use commands::{RegistryCommand, RegistryError};
pub use handle::RegistryHandle;

const COMMAND_BUFFER: usize = 100;

/// Spawns the registry actor and returns a handle to it.
///
/// The actor stops once every clone of the handle is dropped.
pub fn spawn_registry() -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    tokio::spawn(RegistryActor::new(cmd_rx).run());
    RegistryHandle::new(cmd_tx)
}
