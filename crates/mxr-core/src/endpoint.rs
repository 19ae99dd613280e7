//! Registry endpoint and credential types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Transport endpoint of a remote registry.
///
/// Parsed from a single `host:port` token. The split happens at the first
/// `:`, both halves must be non-empty and the port must be a decimal `u16`.
/// Anything else is a configuration error, raised before any connection
/// attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Creates an endpoint from already-validated parts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parses a `host:port` token.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let (host, port) = input
            .split_once(':')
            .ok_or_else(|| DomainError::endpoint(input, "expected host:port"))?;

        if host.is_empty() {
            return Err(DomainError::endpoint(input, "host is empty"));
        }
        if port.is_empty() {
            return Err(DomainError::endpoint(input, "port is empty"));
        }
        if !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::endpoint(input, "port must be numeric"));
        }

        let port = port
            .parse::<u16>()
            .map_err(|_| DomainError::endpoint(input, "port is out of range"))?;

        Ok(Self::new(host, port))
    }

    /// Host part, exactly as given.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port number.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for Endpoint {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Static username/password pair supplied at startup.
///
/// The password never appears in `Debug` output, so credentials are safe
/// to carry inside structs that get logged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
