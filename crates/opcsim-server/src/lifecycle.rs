//! Server lifecycle: initialize, start, shut down.
//!
//! [`SimServer::initialize`] builds the store and the device tree,
//! [`SimServer::start`] binds the listener and spawns the gateway on a
//! background task, and [`RunningServer::shutdown`] stops it gracefully.

use std::net::SocketAddr;
use std::sync::Arc;

use opcsim_core::builder::{AddressSpaceBuilder, DeviceNodes};
use opcsim_core::config::SimulatorConfig;
use opcsim_core::namespace::AddressSpace;
use opcsim_core::probe::{SystemClock, SystemMemory};
use opcsim_core::store::VariantStore;
use opcsim_gateway::{EndpointInfo, GatewayState};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::ServerError;

/// An initialized but not yet listening server.
#[derive(Debug)]
pub struct SimServer {
    config: SimulatorConfig,
    state: Arc<GatewayState>,
    nodes: DeviceNodes,
}

impl SimServer {
    /// Build the store and address space described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Build`] if the device tree cannot be
    /// constructed.
    pub fn initialize(config: SimulatorConfig) -> Result<Self, ServerError> {
        let store = VariantStore::new();
        let builder = AddressSpaceBuilder::new(
            store,
            Arc::new(SystemClock),
            Arc::new(SystemMemory::new()),
            config.address_space.clone(),
        );

        let mut space = AddressSpace::new();
        let nodes = builder.build(&mut space)?;
        info!(variables = space.variable_count(), "server initialized");

        let endpoint = EndpointInfo::from_config(&config.server);
        let state = Arc::new(GatewayState::new(Arc::new(space), endpoint));
        Ok(Self {
            config,
            state,
            nodes,
        })
    }

    /// Ids of the nodes created during initialization.
    pub const fn nodes(&self) -> &DeviceNodes {
        &self.nodes
    }

    /// Shared gateway state.
    pub const fn state(&self) -> &Arc<GatewayState> {
        &self.state
    }

    /// Bind the configured port and start serving on a background task.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Gateway`] if the listener cannot be bound.
    pub async fn start(self) -> Result<RunningServer, ServerError> {
        let server = &self.config.server;
        let listener = opcsim_gateway::bind(&server.host, server.port).await?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| opcsim_gateway::ServerError::Bind(format!("listener has no address: {e}")))?;

        log_endpoints(&self.state.endpoint);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            opcsim_gateway::serve(listener, state, async move {
                // A dropped sender also means stop.
                let _ = shutdown_rx.await;
            })
            .await
        });

        info!(%local_addr, "server is now listening");
        Ok(RunningServer::new(local_addr, shutdown_tx, handle))
    }
}

type GatewayTask = JoinHandle<Result<(), opcsim_gateway::ServerError>>;

/// A server whose gateway is serving on a background task.
#[derive(Debug)]
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    /// `None` once the task has been joined.
    handle: Option<GatewayTask>,
}

impl RunningServer {
    const fn new(local_addr: SocketAddr, shutdown_tx: oneshot::Sender<()>, handle: GatewayTask) -> Self {
        Self {
            local_addr,
            shutdown_tx,
            handle: Some(handle),
        }
    }

    /// Address the listener is bound to.
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the gateway task to end on its own.
    ///
    /// Resolves immediately if the task was already joined.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Gateway`] if serving failed, or
    /// [`ServerError::Task`] if the serving task panicked.
    pub async fn stopped(&mut self) -> Result<(), ServerError> {
        let Some(handle) = self.handle.as_mut() else {
            return Ok(());
        };
        let joined = handle.await;
        self.handle = None;
        flatten(joined)
    }

    /// Signal graceful shutdown and wait for the gateway to stop.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Gateway`] if serving failed, or
    /// [`ServerError::Task`] if the serving task panicked.
    pub async fn shutdown(self) -> Result<(), ServerError> {
        if self.shutdown_tx.send(()).is_err() {
            warn!("gateway task already stopped");
        }

        if let Some(handle) = self.handle {
            flatten(handle.await)?;
        }

        info!("server shutdown completed");
        Ok(())
    }
}

fn flatten(
    joined: Result<Result<(), opcsim_gateway::ServerError>, tokio::task::JoinError>,
) -> Result<(), ServerError> {
    joined.map_err(|e| ServerError::Task {
        message: e.to_string(),
    })??;
    Ok(())
}

fn log_endpoints(info: &EndpointInfo) {
    info!(
        product = %info.product_name,
        build_number = %info.build_number,
        build_date = %info.build_date,
        "build info"
    );
    for endpoint in &info.endpoints {
        info!(
            url = %endpoint.endpoint_url,
            security_mode = %endpoint.security_mode,
            policy = endpoint.security_policy_uri,
            tokens = %endpoint.user_token_policies.join(" "),
            "endpoint"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use opcsim_core::config::ServerSection;

    use super::*;

    fn loopback_config(port: u16) -> SimulatorConfig {
        SimulatorConfig {
            server: ServerSection {
                host: String::from("127.0.0.1"),
                port,
                ..ServerSection::default()
            },
            ..SimulatorConfig::default()
        }
    }

    #[test]
    fn initialize_builds_device_tree() {
        let server = SimServer::initialize(SimulatorConfig::default()).unwrap();
        assert_eq!(server.nodes().simulated.len(), 11);
        assert_eq!(server.state().address_space.variable_count(), 15);
        assert_eq!(server.state().endpoint.endpoints.len(), 3);
    }

    #[tokio::test]
    async fn start_then_shutdown() {
        let server = SimServer::initialize(loopback_config(0)).unwrap();
        let running = server.start().await.unwrap();
        assert_ne!(running.local_addr().port(), 0);
        running.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn serve_failure_surfaces_through_stopped() {
        let (shutdown_tx, _shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async {
            Err::<(), _>(opcsim_gateway::ServerError::Serve(String::from("listener closed")))
        });
        let mut running = RunningServer::new(SocketAddr::from(([127, 0, 0, 1], 0)), shutdown_tx, handle);

        let err = running.stopped().await.unwrap_err();
        assert!(matches!(
            err,
            ServerError::Gateway {
                source: opcsim_gateway::ServerError::Serve(_)
            }
        ));

        // Already joined; shutdown must not poll the task again.
        running.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_gateway_is_a_task_error() {
        let (shutdown_tx, _shutdown_rx) = oneshot::channel::<()>();
        let handle: GatewayTask = tokio::spawn(std::future::pending());
        handle.abort();
        let mut running = RunningServer::new(SocketAddr::from(([127, 0, 0, 1], 0)), shutdown_tx, handle);

        let err = running.stopped().await.unwrap_err();
        assert!(matches!(err, ServerError::Task { .. }));
    }

    #[tokio::test]
    async fn occupied_port_is_fatal() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let server = SimServer::initialize(loopback_config(port)).unwrap();
        let err = server.start().await.unwrap_err();
        assert!(matches!(
            err,
            ServerError::Gateway {
                source: opcsim_gateway::ServerError::Bind(_)
            }
        ));
    }
}
