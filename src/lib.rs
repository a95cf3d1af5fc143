//! # hostprobe - A Minimal Host-Introspection Responder
//!
//! hostprobe accepts line-oriented HTTP/1.1 requests and answers with small
//! plain-text reports about the machine it runs on. Each connection is
//! served by its own isolated task, exactly one request per connection.
//!
//! ## Features
//!
//! - **Five report routes**: `/raminfo`, `/sysinfo`, `/loadavg`, `/time`,
//!   `/diskusage`
//! - **Robust I/O**: line reads and writes that survive partial transfers
//!   and interrupted system calls
//! - **Fault containment**: a stuck or panicking handler never affects the
//!   acceptor or other clients
//! - **Maintenance mode**: `kill -USR1 <pid>` toggles a mode where every
//!   connection gets a 503
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              hostprobe                                  │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌──────────┐  │
//! │  │ Acceptor    │───>│ Connection  │───>│  Router     │───>│  Probes  │  │
//! │  │ (server)    │    │  Handler    │    │             │    │ (/proc,  │  │
//! │  └──────┬──────┘    └──────┬──────┘    └─────────────┘    │ uname..) │  │
//! │         │                  │                              └──────────┘  │
//! │         │                  ▼                                            │
//! │         │           ┌─────────────┐    ┌─────────────┐                  │
//! │         │           │  Response   │───>│ Robust I/O  │───> socket       │
//! │         │           │  Writer     │    │             │                  │
//! │         │           └─────────────┘    └─────────────┘                  │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │ Control: MaintenanceMode (SIGUSR1) + Supervisor (task reaper)    │   │
//! │  └──────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use hostprobe::control::{listen_for_toggle, MaintenanceMode};
//! use hostprobe::probes::SystemProbes;
//! use hostprobe::server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let maintenance = MaintenanceMode::new();
//!     listen_for_toggle(maintenance.clone())?;
//!     let server = Server::bind_with(&ServerConfig::default(), SystemProbes::default(), maintenance)?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`io`]: guaranteed-complete `read_line` / `write_all`
//! - [`http`]: request line parsing and response framing
//! - [`routing`]: the URI table
//! - [`probes`]: body generators backed by the host
//! - [`connection`]: the per-connection state machine
//! - [`control`]: maintenance flag, signal wiring, task supervision
//! - [`server`]: listener and accept loop
//! - [`client`]: the request-issuing client
//! - [`logging`]: verbosity configuration

pub mod client;
pub mod connection;
pub mod control;
pub mod http;
pub mod io;
pub mod logging;
pub mod probes;
pub mod routing;
pub mod server;

#[cfg(test)]
mod test_support;

// Re-export commonly used types for convenience
pub use connection::{handle_connection, ConnectionStats, Outcome};
pub use control::{MaintenanceMode, Supervisor};
pub use http::{RequestLine, Response, Status};
pub use logging::LogConfig;
pub use probes::{BodySource, ProbeConfig, SystemProbes};
pub use routing::{route, Route};
pub use server::{Server, ServerConfig, ServerError, DEFAULT_PORT};

/// The default host the client connects to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of hostprobe
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
