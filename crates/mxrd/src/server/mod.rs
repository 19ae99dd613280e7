//! TCP server for the registry.
//!
//! The server:
//! - Listens on a TCP address for client connections
//! - Spawns a `ConnectionHandler` task per client
//! - Supports graceful shutdown via `CancellationToken`
//!
//! ```text
//! ┌─────────────────┐
//! │ RegistryServer  │
//! │   TcpListener   │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │ConnectionHandler│────▶│  RegistryHandle │
//! │   (per client)  │     │                 │
//! └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Accept errors are logged and allow continued operation

mod connection;

pub use connection::{ConnectionError, ConnectionHandler};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mxr_core::Credentials;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::registry::RegistryHandle;

/// Default listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:9875";

/// TCP server exposing a registry.
pub struct RegistryServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    registry: RegistryHandle,

    /// Required handshake credentials; `None` disables authentication
    credentials: Option<Arc<Credentials>>,

    cancel_token: CancellationToken,
    connection_counter: AtomicU64,
}

impl RegistryServer {
    /// Binds the listener. Use port 0 for an ephemeral port.
    ///
    /// # Errors
    ///
    /// `ServerError::Bind` if the address cannot be bound.
    pub async fn bind(
        addr: &str,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let bind_error = |e: std::io::Error| ServerError::Bind {
            addr: addr.to_string(),
            error: e.to_string(),
        };
        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        Ok(Self {
            listener,
            local_addr,
            registry,
            credentials: None,
            cancel_token,
            connection_counter: AtomicU64::new(0),
        })
    }

    /// Requires clients to present these credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials.map(Arc::new);
        self
    }

    /// Address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Currently infallible once bound; accept errors are logged.
    pub async fn run(self) -> Result<(), ServerError> {
        info!(
            addr = %self.local_addr,
            authentication = self.credentials.is_some(),
            "Registry server listening"
        );

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let number = self.connection_counter.fetch_add(1, Ordering::Relaxed);
                            debug!(peer = %peer, connection = number, "Accepted connection");
                            self.handle_connection(stream, number);
                        }
                        Err(e) => error!(error = %e, "Failed to accept connection"),
                    }
                }
            }
        }

        info!("Server stopped");
        Ok(())
    }

    fn handle_connection(&self, stream: TcpStream, connection_number: u64) {
        let (reader, writer) = stream.into_split();
        let handler = ConnectionHandler::new(
            reader,
            writer,
            self.registry.clone(),
            self.credentials.clone(),
            connection_number,
            self.cancel_token.child_token(),
        );
        tokio::spawn(handler.run());
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {error}")]
    Bind { addr: String, error: String },

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
}
