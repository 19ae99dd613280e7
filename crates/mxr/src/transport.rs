//! Transport seam between the engine and a registry.
//!
//! [`Connector`] establishes sessions and [`RegistrySession`] performs the
//! individual registry calls. The production implementation speaks the
//! newline-delimited JSON protocol from `mxr-protocol` over TCP.
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::time::Duration;

use async_trait::async_trait;
use mxr_core::{AttributeDescriptor, AttributeValue, Credentials, Endpoint, ObjectName};
use mxr_protocol::{ClientMessage, ProtocolVersion, RegistryMessage, MAX_MESSAGE_SIZE};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{QueryError, Result};

// ============================================================================
// Traits
// ============================================================================

/// One live session with a registry.
///
/// Calls block the caller until the registry answers or the transport fails.
/// A failed call leaves the session in place; it is never re-established.
#[async_trait]
pub trait RegistrySession: Send {
    /// Identifier the registry assigned to this session.
    fn connection_id(&self) -> &str;

    /// Returns every registered identifier, in registry order.
    async fn query_names(&mut self) -> Result<Vec<String>>;

    /// Returns the declared attributes of one object, in registry order.
    async fn get_info(&mut self, name: &ObjectName) -> Result<Vec<AttributeDescriptor>>;

    /// Returns the current value of one attribute.
    async fn get_attribute(&mut self, name: &ObjectName, attribute: &str) -> Result<AttributeValue>;

    /// Releases the session.
    async fn close(&mut self) -> Result<()>;
}

/// Factory for registry sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Box<dyn RegistrySession>>;
}

// ============================================================================
// Configuration
// ============================================================================

/// Timeouts for the TCP transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Limit for establishing the TCP connection and completing the handshake.
    pub connect_timeout: Duration,

    /// Limit for each request/response exchange.
    pub request_timeout: Duration,
}

impl TransportConfig {
    /// Uses the same limit for connecting and for requests.
    pub fn with_timeout(limit: Duration) -> Self {
        Self {
            connect_timeout: limit,
            request_timeout: limit,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }
}

// ============================================================================
// TCP Connector
// ============================================================================

/// Connects to registries over TCP.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    config: TransportConfig,
}

impl TcpConnector {
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Box<dyn RegistrySession>> {
        let connect_failed = |reason: String| QueryError::ConnectFailed {
            endpoint: endpoint.to_string(),
            reason,
        };

        debug!(endpoint = %endpoint, "Opening TCP connection");

        let stream = match timeout(
            self.config.connect_timeout,
            TcpStream::connect((endpoint.host(), endpoint.port())),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(connect_failed(e.to_string())),
            Err(_) => {
                return Err(connect_failed(format!(
                    "timed out after {:?}",
                    self.config.connect_timeout
                )))
            }
        };

        let mut session = TcpSession::new(stream, self.config.request_timeout);

        match timeout(self.config.connect_timeout, session.handshake(credentials)).await {
            Ok(Ok(())) => Ok(Box::new(session)),
            Ok(Err(QueryError::Rejected { reason, .. })) => Err(QueryError::Rejected {
                endpoint: endpoint.to_string(),
                reason,
            }),
            Ok(Err(e)) => Err(connect_failed(e.to_string())),
            Err(_) => Err(connect_failed("handshake timed out".to_string())),
        }
    }
}

// ============================================================================
// TCP Session
// ============================================================================

/// Session over a TCP stream using JSON lines.
///
/// Requests and responses pair up strictly in order. Once an exchange fails
/// part-way (timeout, truncated or unparsable line, I/O error) the stream may
/// still hold a late reply, so the session is marked out of sync and every
/// later call fails with `ConnectionLost`.
pub struct TcpSession {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    connection_id: String,
    request_timeout: Duration,
    out_of_sync: bool,
}

impl TcpSession {
    fn new(stream: TcpStream, request_timeout: Duration) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
            connection_id: String::new(),
            request_timeout,
            out_of_sync: false,
        }
    }

    /// Sends `connect` and waits for `connected`.
    async fn handshake(&mut self, credentials: &Credentials) -> Result<()> {
        let response = self.request(&ClientMessage::connect(credentials.clone())).await?;

        match response {
            RegistryMessage::Connected {
                protocol_version,
                connection_id,
            } => {
                if !ProtocolVersion::CURRENT.is_compatible_with(&protocol_version) {
                    return Err(QueryError::Rejected {
                        endpoint: String::new(),
                        reason: format!(
                            "protocol version mismatch (client: {}, registry: {protocol_version})",
                            ProtocolVersion::CURRENT
                        ),
                    });
                }
                debug!(connection_id = %connection_id, protocol_version = %protocol_version, "Handshake complete");
                self.connection_id = connection_id;
                Ok(())
            }
            RegistryMessage::Rejected { reason, .. } => Err(QueryError::Rejected {
                endpoint: String::new(),
                reason,
            }),
            other => Err(unexpected(&other)),
        }
    }

    async fn send(&mut self, message: &ClientMessage) -> Result<()> {
        let json = serde_json::to_string(message)?;
        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        debug!(message_type = ?message.message, "Sent message to registry");
        Ok(())
    }

    async fn recv(&mut self) -> Result<RegistryMessage> {
        let limit = self.request_timeout;
        let mut line = String::new();

        let mut bounded = (&mut self.reader).take(MAX_MESSAGE_SIZE as u64 + 1);
        let read = timeout(limit, bounded.read_line(&mut line))
            .await
            .map_err(|_| QueryError::Timeout(limit))??;

        if read == 0 {
            return Err(QueryError::ConnectionLost);
        }
        if line.len() > MAX_MESSAGE_SIZE {
            return Err(QueryError::Protocol(format!(
                "message exceeds {MAX_MESSAGE_SIZE} bytes"
            )));
        }

        let message: RegistryMessage = serde_json::from_str(line.trim())?;
        debug!(message_type = message.kind(), "Received message from registry");
        Ok(message)
    }

    async fn request(&mut self, message: &ClientMessage) -> Result<RegistryMessage> {
        if self.out_of_sync {
            return Err(QueryError::ConnectionLost);
        }

        let result = match self.send(message).await {
            Ok(()) => self.recv().await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            warn!(
                connection_id = %self.connection_id,
                error = %e,
                "Exchange with registry failed; session unusable"
            );
            self.out_of_sync = true;
        }
        result
    }
}

#[async_trait]
impl RegistrySession for TcpSession {
    fn connection_id(&self) -> &str {
        &self.connection_id
    }

    async fn query_names(&mut self) -> Result<Vec<String>> {
        match self.request(&ClientMessage::query_names()).await? {
            RegistryMessage::Names { names } => Ok(names),
            RegistryMessage::Error { code, message } => {
                Err(QueryError::from_remote(code, message, "*", ""))
            }
            other => Err(unexpected(&other)),
        }
    }

    async fn get_info(&mut self, name: &ObjectName) -> Result<Vec<AttributeDescriptor>> {
        let object_name = name.to_string();
        match self.request(&ClientMessage::get_info(object_name.as_str())).await? {
            RegistryMessage::Info { attributes, .. } => Ok(attributes),
            RegistryMessage::Error { code, message } => {
                Err(QueryError::from_remote(code, message, &object_name, ""))
            }
            other => Err(unexpected(&other)),
        }
    }

    async fn get_attribute(&mut self, name: &ObjectName, attribute: &str) -> Result<AttributeValue> {
        let object_name = name.to_string();
        let message = ClientMessage::get_attribute(object_name.as_str(), attribute);
        match self.request(&message).await? {
            RegistryMessage::Value { value, .. } => Ok(value),
            RegistryMessage::Error { code, message } => {
                Err(QueryError::from_remote(code, message, &object_name, attribute))
            }
            other => Err(unexpected(&other)),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if !self.out_of_sync {
            self.send(&ClientMessage::disconnect()).await?;
        }
        self.writer.shutdown().await?;
        Ok(())
    }
}

fn unexpected(message: &RegistryMessage) -> QueryError {
    QueryError::Protocol(format!("unexpected '{}' message from registry", message.kind()))
}

// ============================================================================
// Tests
// ============================================================================
