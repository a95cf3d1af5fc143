//! Acceptor Loop
//!
//! Owns the listening socket and turns each accepted connection into either
//! an immediate 503 (maintenance mode) or a supervised handler task.
//!
//! ```text
//!            ┌────────────────────────────────────────────┐
//!            │                Server::run                 │
//!            │                                            │
//!  accept ──>│  maintenance? ──yes──> 503, close          │
//!            │       │                                    │
//!            │       no                                   │
//!            │       ▼                                    │
//!            │  Supervisor::spawn(handle_connection)      │
//!            │                                            │
//!  task  ───>│  Supervisor::record (reap, log panics)     │
//!  done      └────────────────────────────────────────────┘
//! ```
//!
//! Accept failures are logged and retried; the loop never exits on its own.

pub mod acceptor;

pub use acceptor::{Server, ServerConfig, ServerError, DEFAULT_BACKLOG, DEFAULT_PORT};
