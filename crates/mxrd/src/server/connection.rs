//! Connection handler for individual client connections.
//!
//! Each client connection gets its own `ConnectionHandler` that:
//! - Performs the version and credential handshake
//! - Parses incoming requests
//! - Routes them to the registry and writes one response per request
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Connection errors are logged and result in graceful disconnect

use std::sync::Arc;
use std::time::Duration;

use mxr_core::{Credentials, ObjectName};
use mxr_protocol::{
    ClientMessage, ErrorCode, ProtocolVersion, RegistryMessage, RequestType, MAX_MESSAGE_SIZE,
};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::{RegistryError, RegistryHandle};

/// Read timeout for idle connections (5 minutes)
const READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Write timeout (10 seconds)
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection handler for a single client.
pub struct ConnectionHandler {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    registry: RegistryHandle,

    /// Expected credentials; `None` accepts any
    credentials: Option<Arc<Credentials>>,

    /// Assigned after a successful handshake
    connection_id: Option<String>,

    connection_number: u64,
    cancel_token: CancellationToken,
}

impl ConnectionHandler {
    pub fn new(
        reader: OwnedReadHalf,
        writer: OwnedWriteHalf,
        registry: RegistryHandle,
        credentials: Option<Arc<Credentials>>,
        connection_number: u64,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer: BufWriter::new(writer),
            registry,
            credentials,
            connection_id: None,
            connection_number,
            cancel_token,
        }
    }

    /// Runs the handshake and then serves requests until the client
    /// disconnects, the connection fails, or the server shuts down.
    pub async fn run(mut self) {
        debug!(connection = self.connection_number, "New client connected");

        match timeout(READ_TIMEOUT, self.handle_handshake()).await {
            Ok(Ok(())) => {
                info!(connection_id = ?self.connection_id, "Client handshake completed");
            }
            Ok(Err(e)) => {
                warn!(connection = self.connection_number, error = %e, "Handshake failed");
                return;
            }
            Err(_) => {
                warn!(connection = self.connection_number, "Handshake timed out");
                return;
            }
        }

        if let Err(e) = self.process_messages().await {
            debug!(connection_id = ?self.connection_id, error = %e, "Connection closed");
        }

        info!(connection_id = ?self.connection_id, "Client disconnected");
    }

    /// Expects `connect`, checks version and credentials, and answers with
    /// `connected` or `rejected`.
    async fn handle_handshake(&mut self) -> Result<(), ConnectionError> {
        let msg = self.read_message().await?;

        let client_version = msg.protocol_version;
        if !client_version.is_compatible_with(&ProtocolVersion::CURRENT) {
            warn!(
                client_version = %client_version,
                server_version = %ProtocolVersion::CURRENT,
                "Protocol version mismatch"
            );
            self.send_message(RegistryMessage::rejected(&format!(
                "Protocol version {} not compatible with server version {}",
                client_version,
                ProtocolVersion::CURRENT
            )))
            .await?;

            return Err(ConnectionError::VersionMismatch {
                client: client_version,
                server: ProtocolVersion::CURRENT,
            });
        }

        match msg.message {
            RequestType::Connect { credentials } => {
                if let Some(expected) = &self.credentials {
                    if **expected != credentials {
                        self.send_message(RegistryMessage::rejected("invalid credentials"))
                            .await?;
                        return Err(ConnectionError::AuthenticationFailed {
                            username: credentials.username().to_string(),
                        });
                    }
                }

                let connection_id = format!("conn-{}", self.connection_number);
                self.connection_id = Some(connection_id.clone());
                self.send_message(RegistryMessage::connected(connection_id))
                    .await
            }
            other => {
                self.send_message(RegistryMessage::error(
                    ErrorCode::Unauthorized,
                    "Expected connect message for handshake",
                ))
                .await?;
                Err(ConnectionError::UnexpectedMessage(format!("{other:?}")))
            }
        }
    }

    async fn process_messages(&mut self) -> Result<(), ConnectionError> {
        let cancel_token = self.cancel_token.clone();
        loop {
            let read = tokio::select! {
                _ = cancel_token.cancelled() => {
                    debug!("Server shutting down, closing connection");
                    return Ok(());
                }
                read = timeout(READ_TIMEOUT, self.read_message()) => read,
            };

            let msg = match read {
                Ok(Ok(msg)) => msg,
                Ok(Err(ConnectionError::Eof)) => {
                    debug!(connection_id = ?self.connection_id, "Client sent EOF");
                    return Ok(());
                }
                Ok(Err(ConnectionError::ParseError(e))) => {
                    // Unknown or malformed request: answer and keep the session
                    self.send_message(RegistryMessage::error(ErrorCode::Unsupported, e))
                        .await?;
                    continue;
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(ConnectionError::Timeout),
            };

            if matches!(msg.message, RequestType::Disconnect) {
                debug!(connection_id = ?self.connection_id, "Client requested disconnect");
                return Ok(());
            }

            let response = self.handle_request(msg.message).await;
            self.send_message(response).await?;
        }
    }

    /// Builds the response to one request.
    async fn handle_request(&self, request: RequestType) -> RegistryMessage {
        match request {
            RequestType::Connect { .. } => {
                RegistryMessage::error(ErrorCode::Unsupported, "Already connected")
            }
            RequestType::QueryNames => match self.registry.query_names().await {
                Ok(names) => RegistryMessage::names(names),
                Err(e) => registry_error(&e),
            },
            RequestType::GetInfo { object_name } => {
                let name = match ObjectName::parse(&object_name) {
                    Ok(name) => name,
                    Err(e) => return RegistryMessage::error(ErrorCode::MalformedName, e.to_string()),
                };
                match self.registry.get_info(name).await {
                    Ok(attributes) => RegistryMessage::info(object_name, attributes),
                    Err(e) => registry_error(&e),
                }
            }
            RequestType::GetAttribute {
                object_name,
                attribute,
            } => {
                let name = match ObjectName::parse(&object_name) {
                    Ok(name) => name,
                    Err(e) => return RegistryMessage::error(ErrorCode::MalformedName, e.to_string()),
                };
                match self.registry.get_attribute(name, attribute.as_str()).await {
                    Ok(value) => RegistryMessage::value(object_name, attribute, value),
                    Err(e) => registry_error(&e),
                }
            }
            RequestType::Disconnect => {
                RegistryMessage::error(ErrorCode::Internal, "Disconnect is not a request")
            }
        }
    }

    /// Reads one newline-terminated message, bounded by `MAX_MESSAGE_SIZE`.
    async fn read_message(&mut self) -> Result<ClientMessage, ConnectionError> {
        let mut line = String::new();

        let bytes_read = (&mut self.reader)
            .take(MAX_MESSAGE_SIZE as u64 + 1)
            .read_line(&mut line)
            .await
            .map_err(|e| ConnectionError::Io(e.to_string()))?;

        if bytes_read == 0 {
            return Err(ConnectionError::Eof);
        }

        if line.len() > MAX_MESSAGE_SIZE {
            return Err(ConnectionError::MessageTooLarge {
                size: line.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }

        let msg: ClientMessage = serde_json::from_str(line.trim())
            .map_err(|e| ConnectionError::ParseError(e.to_string()))?;

        debug!(
            connection_id = ?self.connection_id,
            message_type = ?std::mem::discriminant(&msg.message),
            "Received message"
        );

        Ok(msg)
    }

    async fn send_message(&mut self, msg: RegistryMessage) -> Result<(), ConnectionError> {
        let json =
            serde_json::to_string(&msg).map_err(|e| ConnectionError::ParseError(e.to_string()))?;
        let writer = &mut self.writer;

        match timeout(WRITE_TIMEOUT, async {
            writer.write_all(json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
            Ok::<(), std::io::Error>(())
        })
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ConnectionError::Io(e.to_string())),
            Err(_) => Err(ConnectionError::WriteTimeout),
        }
    }
}

fn registry_error(error: &RegistryError) -> RegistryMessage {
    RegistryMessage::error(error.code(), error.to_string())
}

/// Errors that can occur during connection handling.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Protocol version mismatch: client {client}, server {server}")]
    VersionMismatch {
        client: ProtocolVersion,
        server: ProtocolVersion,
    },

    #[error("Authentication failed for user '{username}'")]
    AuthenticationFailed { username: String },

    #[error("Unexpected message: {0}")]
    UnexpectedMessage(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Connection closed")]
    Eof,

    #[error("Read timeout")]
    Timeout,

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}
