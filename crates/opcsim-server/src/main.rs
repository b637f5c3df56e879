//! Server binary for the opcsim device simulator.
//!
//! Loads configuration, builds the simulated device, serves it until a
//! termination signal arrives, and shuts down gracefully.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `opcsim-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the variant store and address space
//! 4. Bind the listener and log every advertised endpoint
//! 5. Serve until SIGINT or SIGTERM, or until the gateway fails
//! 6. Shut down and log completion
//!
//! Any startup failure is logged and the process exits with status 1.

mod error;
mod lifecycle;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use opcsim_core::config::SimulatorConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::ServerError;
use crate::lifecycle::SimServer;

/// Configuration file looked up in the working directory.
const CONFIG_FILE: &str = "opcsim-config.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    let loaded = load_config();
    let level = loaded
        .as_ref()
        .map_or("info", |config| config.logging.level.as_str());
    init_tracing(level);

    match run(loaded).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(loaded: Result<SimulatorConfig, ServerError>) -> Result<(), ServerError> {
    let config = loaded?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        allow_anonymous = config.server.allow_anonymous,
        "configuration loaded"
    );

    let server = SimServer::initialize(config)?;
    let nodes = server.nodes();
    info!(
        temperature = %nodes.temperature,
        memory_used = %nodes.memory_used,
        simulated = nodes.simulated.len(),
        variables = server.state().address_space.variable_count(),
        "device ready"
    );

    let mut running = server.start().await?;
    info!("press CTRL+C to stop");

    let stopped_early = tokio::select! {
        () = shutdown_signal() => None,
        result = running.stopped() => Some(result),
    };

    match stopped_early {
        None => {
            info!("shutdown signal received");
            running.shutdown().await
        }
        Some(result) => {
            error!("gateway stopped before shutdown was requested");
            result?;
            Err(ServerError::Task {
                message: String::from("gateway stopped unexpectedly"),
            })
        }
    }
}

/// Install the tracing subscriber, preferring `RUST_LOG` over `level`.
fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(true)
        .init();
}

/// Load configuration from [`CONFIG_FILE`], or defaults if it is absent.
///
/// Environment overrides apply in both cases.
fn load_config() -> Result<SimulatorConfig, ServerError> {
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        Ok(SimulatorConfig::from_file(config_path)?)
    } else {
        Ok(SimulatorConfig::parse("")?)
    }
}

/// Resolve on SIGINT or SIGTERM (Ctrl-C off unix).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => {}
                    _ = sigterm.recv() => {}
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, "failed to install signal handlers, waiting for ctrl-c");
                ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    park_on_error(tokio::signal::ctrl_c()).await;
}

/// Resolve when `listen` does. If it fails, log and never resolve; a
/// stopped gateway still ends the process.
async fn park_on_error<F>(listen: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = listen.await {
        error!(error = %e, "failed to listen for ctrl-c, continuing without it");
        std::future::pending::<()>().await;
    }
}
