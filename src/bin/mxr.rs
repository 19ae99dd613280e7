//! mxr - query and poll a remote managed-object registry
//!
//! # Usage
//!
//! ```text
//! mxr list localhost:9875 admin secret
//! mxr attr localhost:9875 admin secret 'mxrd:type=Pool,name=default'
//! mxr get  localhost:9875 admin secret 'mxrd:type=Pool.*' size true 1
//! ```
//!
//! Results go to stdout, diagnostics to stderr. Argument errors exit with
//! status 2; every other failure is reported and the exit status stays 0.
//!
//! # Signal Handling
//!
//! SIGINT/SIGTERM stop the current request; the connection is then closed.

use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use mxr_client::cli::Args;
use mxr_client::{run, Diagnostics, RegistryConnection, TcpConnector};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .with_env_filter(EnvFilter::from_default_env().add_directive(args.log_directive().parse()?))
        .init();

    let request = match args.request() {
        Ok(request) => request,
        Err(e) => Args::command()
            .error(clap::error::ErrorKind::MissingRequiredArgument, e.to_string())
            .exit(),
    };

    debug!(endpoint = %args.endpoint, request = ?request, "Starting");

    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
            return;
        }
        shutdown_token.cancel();
    });

    let mut connection = RegistryConnection::new(
        args.endpoint.clone(),
        args.credentials(),
        TcpConnector::new(args.transport_config()),
        Diagnostics::tracing(),
    )
    .announce_until_interrupted(request.is_repeating());

    let mut stdout = io::stdout();
    tokio::select! {
        result = run(&request, &mut connection, &cancel_token, &mut stdout) => {
            if let Err(e) = result {
                error!(error = %e, "Failed to write output");
            }
        }
        () = cancel_token.cancelled() => {
            info!("Interrupted");
        }
    }

    connection.close().await;
    Ok(())
}

/// Waits for SIGTERM or SIGINT (Ctrl+C elsewhere).
async fn wait_for_shutdown_signal() -> io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => debug!("Received SIGTERM"),
            _ = sigint.recv() => debug!("Received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        debug!("Received Ctrl+C");
    }

    Ok(())
}
