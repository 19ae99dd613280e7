//! The process-wide registry connection.
//!
//! A [`RegistryConnection`] is created once in `main` and passed by `&mut`
//! into the resolver, query engine and polling loop. It owns at most one
//! live session:
//!
//! - the session is opened on the first [`RegistryConnection::connect`] call,
//! - later calls reuse it without touching the transport,
//! - it is never re-established after a failure,
//! - [`RegistryConnection::close`] releases it exactly once.
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use mxr_core::{Credentials, Endpoint};
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::error::{QueryError, Result};
use crate::transport::{Connector, RegistrySession};

/// Single owned connection to one registry endpoint.
pub struct RegistryConnection {
    /// Where the registry listens.
    endpoint: Endpoint,

    /// Credential pair used for the handshake; never logged.
    credentials: Credentials,

    /// Transport used to open the session.
    connector: Box<dyn Connector>,

    /// Sink for handled errors and notices.
    diagnostics: Diagnostics,

    /// The live session, if one has been established.
    session: Option<Box<dyn RegistrySession>>,

    /// Announce on connect that the command runs until interrupted.
    announce_loop: bool,
}

impl RegistryConnection {
    /// Creates an unconnected handle; nothing touches the network yet.
    pub fn new(
        endpoint: Endpoint,
        credentials: Credentials,
        connector: impl Connector + 'static,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            endpoint,
            credentials,
            connector: Box::new(connector),
            diagnostics,
            session: None,
            announce_loop: false,
        }
    }

    /// Enables the one-time "runs until interrupted" notice on first connect.
    #[must_use]
    pub fn announce_until_interrupted(mut self, enabled: bool) -> Self {
        self.announce_loop = enabled;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Returns true while a session is live.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Establishes the session if none exists.
    ///
    /// # Errors
    ///
    /// Returns the connector's error when the transport fails or the
    /// registry rejects the handshake. The connection stays unconnected.
    pub async fn try_connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            debug!(endpoint = %self.endpoint, "Reusing live registry connection");
            return Ok(());
        }

        debug!(
            endpoint = %self.endpoint,
            username = %self.credentials.username(),
            "Connecting to registry"
        );

        let session = self
            .connector
            .connect(&self.endpoint, &self.credentials)
            .await?;

        debug!(
            endpoint = %self.endpoint,
            connection_id = %session.connection_id(),
            "Connected to registry"
        );

        if self.announce_loop {
            self.diagnostics.notice(&format!(
                "Connected to {}; will run until interrupted (Ctrl+C)",
                self.endpoint
            ));
        }

        self.session = Some(session);
        Ok(())
    }

    /// Establishes the session if none exists, reporting any failure.
    ///
    /// Returns whether a session is live afterwards. A failure is reported
    /// as a connect error and leaves the connection unconnected; operations
    /// that need a session then report their own `NotConnected` error.
    pub async fn connect(&mut self) -> bool {
        match self.try_connect().await {
            Ok(()) => true,
            Err(e) => {
                self.diagnostics.report(&e);
                false
            }
        }
    }

    /// Borrows the live session.
    ///
    /// # Errors
    ///
    /// `QueryError::NotConnected` when no session was established.
    pub fn session(&mut self) -> Result<&mut Box<dyn RegistrySession>> {
        self.session.as_mut().ok_or(QueryError::NotConnected)
    }

    /// Releases the session exactly once.
    ///
    /// A failure to close is reported and otherwise ignored; the process is
    /// terminating anyway. Calling this again, or without a session, is a
    /// no-op.
    pub async fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            debug!("No registry connection to close");
            return;
        };

        let connection_id = session.connection_id().to_string();
        match session.close().await {
            Ok(()) => debug!(connection_id = %connection_id, "Registry connection closed"),
            Err(e) => self.diagnostics.report(&QueryError::Close {
                connection_id,
                reason: e.to_string(),
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
