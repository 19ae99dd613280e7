//! Request dispatch.
//!
//! A [`Request`] is built from validated command-line arguments and executed
//! against an established [`RegistryConnection`], writing plain text lines.

use std::io::{self, Write};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::connection::RegistryConnection;
use crate::polling::{PollMode, PollingLoop};
use crate::query::AttributeQueryEngine;

/// One validated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Print every registered identifier.
    List,
    /// Print the attribute descriptors of one object.
    Attributes { object: String },
    /// Print one attribute's value, once or repeatedly.
    Get {
        object: String,
        attribute: String,
        mode: PollMode,
    },
}

impl Request {
    /// Whether the command runs until interrupted.
    pub fn is_repeating(&self) -> bool {
        matches!(self, Self::Get { mode, .. } if mode.is_repeating())
    }
}

/// Connects, then executes `request`.
///
/// A failed connect has already been reported. `list` and `attr` then have
/// nothing to show, while `get` still runs and prints the no-connection
/// placeholder for every sample.
///
/// # Errors
///
/// Only write failures on `out`.
pub async fn run<W: Write>(
    request: &Request,
    connection: &mut RegistryConnection,
    cancel: &CancellationToken,
    out: &mut W,
) -> io::Result<()> {
    if !connection.connect().await && !matches!(request, Request::Get { .. }) {
        return Ok(());
    }
    execute(request, connection, cancel, out).await
}

/// Executes `request`, writing one item per line to `out`.
///
/// Registry failures have already been reported by the time this returns and
/// only shorten the output.
///
/// # Errors
///
/// Only write failures on `out`.
pub async fn execute<W: Write>(
    request: &Request,
    connection: &mut RegistryConnection,
    cancel: &CancellationToken,
    out: &mut W,
) -> io::Result<()> {
    debug!(request = ?request, "Executing request");

    match request {
        Request::List => {
            let mut engine = AttributeQueryEngine::new(connection);
            for name in engine.resolver().list_all().await {
                writeln!(out, "{name}")?;
            }
        }
        Request::Attributes { object } => {
            let mut engine = AttributeQueryEngine::new(connection);
            let Some(target) = engine.resolver().resolve(object).await else {
                return Ok(());
            };
            for descriptor in engine.list_attributes(&target).await {
                writeln!(out, "{descriptor}")?;
            }
        }
        Request::Get {
            object,
            attribute,
            mode,
        } => {
            PollingLoop::new(connection, *mode, cancel.clone())
                .run(object, attribute, out)
                .await?;
        }
    }

    out.flush()
}

// ============================================================================
// Tests
// ============================================================================
