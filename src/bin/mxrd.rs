//! mxrd - reference managed-object registry server
//!
//! Serves a handful of demo objects over the mxr protocol so the client has
//! something to talk to.
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default address without authentication
//! mxrd
//!
//! # Require credentials and listen elsewhere
//! mxrd --listen 0.0.0.0:9875 --username admin --password secret
//!
//! # Enable debug logging
//! RUST_LOG=mxrd=debug mxrd
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: Graceful shutdown

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use mxr_core::Credentials;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mxrd::demo::register_demo_objects;
use mxrd::{spawn_registry, RegistryServer, DEFAULT_LISTEN_ADDR};

/// mxrd - managed-object registry server
// No Debug derive: holds the password.
#[derive(Parser)]
#[command(name = "mxrd", version, about)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = DEFAULT_LISTEN_ADDR)]
    listen: String,

    /// Username clients must present
    #[arg(long, requires = "password")]
    username: Option<String>,

    /// Password clients must present
    #[arg(long, requires = "username")]
    password: Option<String>,
}

impl Args {
    fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password)),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("mxrd=info".parse()?)
                .add_directive("mxr_protocol=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "mxrd starting"
    );

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let registry = spawn_registry();
    register_demo_objects(&registry)
        .await
        .context("Failed to register demo objects")?;
    info!("Demo objects registered");

    let server = RegistryServer::bind(&args.listen, registry, cancel_token)
        .await?
        .with_credentials(args.credentials());

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("mxrd stopped");
    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
