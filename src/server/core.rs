use chrono::Utc;
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::client::{ClientRegistry, handle_client};
use crate::config::ServerConfig;
use crate::protocol::responses::{TOO_MANY_CLIENTS, format_response};
use crate::server::DriveState;

pub struct Server {
    state: Arc<DriveState>,
    client_registry: Arc<Mutex<ClientRegistry>>,
    listener: TcpListener,
}

impl Server {
    /// Binds the control socket and prepares the storage and recycle roots.
    pub async fn new(config: ServerConfig) -> Result<Self, std::io::Error> {
        let state = DriveState::new(config);
        let socket = state.startup.control_socket();

        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e);
            }
        };

        std::fs::create_dir_all(state.startup.recycle_dir_path())?;
        info!(
            "Storage root: {}",
            state.startup.storage_root_path().display()
        );

        if state.app_scope.scoping_enabled() {
            info!(
                "App scoping enabled under {}",
                state.app_scope.normalized_prefix()
            );
        }

        Ok(Self {
            state: Arc::new(state),
            client_registry: Arc::new(Mutex::new(ClientRegistry::new())),
            listener,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> Arc<DriveState> {
        Arc::clone(&self.state)
    }

    pub async fn start(&self) {
        let max_clients = self.state.runtime.read().await.max_clients;
        info!(
            "Starting rax-drive on {} (max {} clients)",
            self.state.startup.control_socket(),
            max_clients
        );

        spawn_retention_sweep(Arc::clone(&self.state));

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&self.state);
                    let client_registry = Arc::clone(&self.client_registry);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) = handle_new_client(stream, addr, state, client_registry).await
                        {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Registers a new connection against the client limit and runs its session.
async fn handle_new_client(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    state: Arc<DriveState>,
    client_registry: Arc<Mutex<ClientRegistry>>,
) -> Result<(), std::io::Error> {
    let max_clients = state.runtime.read().await.max_clients;

    let admitted = client_registry
        .lock()
        .await
        .try_insert(client_addr, max_clients);
    if !admitted {
        let response = format_response(TOO_MANY_CLIENTS, "Too many connections. Try again later.");
        stream.write_all(response.as_bytes()).await?;
        return Ok(());
    }

    info!("Accepted client {}", client_addr);
    handle_client(stream, client_addr, state, client_registry).await;
    Ok(())
}

/// Periodically purges recycled files older than the retention window.
fn spawn_retention_sweep(state: Arc<DriveState>) {
    let period = state.startup.sweep_interval();
    let retention = state.startup.recycle_retention();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            state.recycle.sweep_expired(Utc::now(), retention).await;
        }
    });
}
