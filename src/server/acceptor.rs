//! Listener setup and the accept loop.

use crate::connection::{handle_connection, ConnectionStats};
use crate::control::{MaintenanceMode, Supervisor};
use crate::http::{send_response, Response};
use crate::probes::BodySource;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tracing::{debug, error, info};

/// The port hostprobe listens on by default
pub const DEFAULT_PORT: u16 = 9999;

/// Listen backlog, sized for bursts of short-lived connections
pub const DEFAULT_BACKLOG: u32 = 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:9999)
    pub bind_address: SocketAddr,

    /// Pending-connection queue length
    pub backlog: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            backlog: DEFAULT_BACKLOG,
        }
    }
}

/// Startup failures. All of them are fatal.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("socket error: {0}")]
    Socket(#[source] io::Error),

    #[error("bind error on {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("listen error: {0}")]
    Listen(#[source] io::Error),
}

/// A bound server, ready to run.
pub struct Server<S> {
    listener: TcpListener,
    source: Arc<S>,
    maintenance: MaintenanceMode,
    stats: Arc<ConnectionStats>,
    supervisor: Supervisor,
}

impl<S: BodySource> Server<S> {
    /// Creates the listening socket with `SO_REUSEADDR`, binds and listens.
    ///
    /// The server gets its own maintenance flag, off. Must be called from
    /// within a tokio runtime.
    pub fn bind(config: &ServerConfig, source: S) -> Result<Self, ServerError> {
        Self::bind_with(config, source, MaintenanceMode::new())
    }

    /// Like [`Server::bind`], but shares an existing maintenance flag.
    ///
    /// Lets the `SIGUSR1` listener be registered before the socket exists.
    pub fn bind_with(
        config: &ServerConfig,
        source: S,
        maintenance: MaintenanceMode,
    ) -> Result<Self, ServerError> {
        let addr = config.bind_address;
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(ServerError::Socket)?;

        socket.set_reuseaddr(true).map_err(ServerError::Socket)?;
        socket
            .bind(addr)
            .map_err(|source| ServerError::Bind { addr, source })?;
        let listener = socket.listen(config.backlog).map_err(ServerError::Listen)?;

        info!(address = %addr, backlog = config.backlog, "Listener bound");

        Ok(Self {
            listener,
            source: Arc::new(source),
            maintenance,
            stats: Arc::new(ConnectionStats::new()),
            supervisor: Supervisor::new(),
        })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// A handle to this server's maintenance flag.
    pub fn maintenance(&self) -> MaintenanceMode {
        self.maintenance.clone()
    }

    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Runs the accept loop forever.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => self.on_accept(accepted).await,
                Some(result) = self.supervisor.join_next(), if !self.supervisor.is_empty() => {
                    self.supervisor.record(result);
                }
            }
        }
    }

    async fn on_accept(&mut self, accepted: io::Result<(TcpStream, SocketAddr)>) {
        let (stream, addr) = match accepted {
            Ok(pair) => pair,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                debug!("accept() was interrupted, retrying");
                return;
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
                return;
            }
        };

        self.stats.connection_accepted();

        if self.maintenance.is_enabled() {
            reject(stream, addr, &self.stats).await;
            return;
        }

        let source = Arc::clone(&self.source);
        let stats = Arc::clone(&self.stats);
        self.supervisor.spawn(async move {
            handle_connection(stream, addr, source, stats).await;
        });
        debug!(client = %addr, outstanding = self.supervisor.len(), "Spawned handler");

        self.supervisor.reap();
    }
}

/// Answers with the maintenance 503 and closes, without spawning a handler
/// or reading the request.
async fn reject(mut stream: TcpStream, addr: SocketAddr, stats: &ConnectionStats) {
    info!(client = %addr, "Server in maintenance, rejecting client");

    match send_response(&mut stream, &Response::maintenance()).await {
        Ok(written) => stats.bytes_written(written),
        Err(e) => debug!(client = %addr, error = %e, "Failed to send maintenance response"),
    }
    stats.maintenance_rejected();
    let _ = stream.shutdown().await;
}
