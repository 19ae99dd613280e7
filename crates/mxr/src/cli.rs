//! Command-line arguments for the `mxr` binary.
//!
//! Arguments are positional and keep the historical order:
//!
//! ```text
//! mxr <action> <host:port> <username> <password> [objectName] [attributeName] [infinite] [pause]
//! ```

use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use mxr_core::{Credentials, Endpoint};

use crate::app::Request;
use crate::error::{QueryError, Result};
use crate::polling::PollMode;
use crate::transport::TransportConfig;

/// Registry operation to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Print every registered object identifier
    List,
    /// Print the attributes of one object
    Attr,
    /// Print the value of one attribute
    Get,
}

/// mxr - query a managed-object registry
// No Debug derive: the password is a plain positional value.
#[derive(Parser)]
#[command(name = "mxr")]
#[command(about = "Query objects and attributes of a managed-object registry")]
#[command(version)]
pub struct Args {
    /// Operation to perform
    #[arg(value_enum)]
    pub action: Action,

    /// Registry endpoint
    #[arg(value_name = "HOST:PORT")]
    pub endpoint: Endpoint,

    /// Username for the registry handshake
    pub username: String,

    /// Password for the registry handshake
    pub password: String,

    /// Object identifier; `*` makes it a pattern (required by attr and get)
    #[arg(value_name = "OBJECT_NAME")]
    pub object_name: Option<String>,

    /// Attribute to read (required by get)
    #[arg(value_name = "ATTRIBUTE_NAME")]
    pub attribute_name: Option<String>,

    /// Keep sampling until interrupted (get only)
    #[arg(action = ArgAction::Set, default_value_t = false)]
    pub infinite: bool,

    /// Seconds to wait between samples
    #[arg(default_value_t = 0)]
    pub pause: u64,

    /// Connect and request timeout in seconds
    #[arg(long, default_value_t = 30, value_name = "SECS")]
    pub timeout: u64,

    /// Increase diagnostic output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Validates the argument combination into a [`Request`].
    ///
    /// # Errors
    ///
    /// `QueryError::Config` when the action is missing an identifier or an
    /// attribute name.
    pub fn request(&self) -> Result<Request> {
        match self.action {
            Action::List => Ok(Request::List),
            Action::Attr => Ok(Request::Attributes {
                object: self.required_object()?,
            }),
            Action::Get => {
                let object = self.required_object()?;
                let attribute = self.attribute_name.clone().ok_or_else(|| {
                    QueryError::Config("get requires an attribute name".to_string())
                })?;
                Ok(Request::Get {
                    object,
                    attribute,
                    mode: PollMode::from_args(self.infinite, self.pause),
                })
            }
        }
    }

    fn required_object(&self) -> Result<String> {
        self.object_name.clone().ok_or_else(|| {
            let action = match self.action {
                Action::List => "list",
                Action::Attr => "attr",
                Action::Get => "get",
            };
            QueryError::Config(format!("{action} requires an object name"))
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig::with_timeout(Duration::from_secs(self.timeout))
    }

    /// Log directive for this crate at the requested verbosity.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "mxr_client=info",
            1 => "mxr_client=debug",
            _ => "mxr_client=trace",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
