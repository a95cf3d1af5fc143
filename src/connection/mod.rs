//! Connection Handler Module
//!
//! Each accepted connection is served by its own tokio task running a
//! [`ConnectionHandler`]. Handlers share nothing mutable with each other or
//! with the acceptor except the atomic [`ConnectionStats`] counters, so a
//! slow or misbehaving peer only ever stalls its own task.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Acceptor Loop                           │
//! │                    (server module)                          │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept() + maintenance check
//!                        ▼
//!           ┌────────────────────────┐
//!           │   For each client...   │
//!           └────────────┬───────────┘
//!                        │
//!                        │ spawn task (Supervisor)
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ Read line   │───>│ Drain hdrs  │───>│ Route       │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │                                               │             │
//! │                                               ▼             │
//! │                                      ┌─────────────┐        │
//! │                                      │ Send resp   │        │
//! │                                      └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use hostprobe::connection::{handle_connection, ConnectionStats};
//! use hostprobe::probes::SystemProbes;
//! use std::sync::Arc;
//!
//! let source = Arc::new(SystemProbes::default());
//! let stats = Arc::new(ConnectionStats::new());
//!
//! // For each accepted connection...
//! let (stream, addr) = listener.accept().await?;
//! tokio::spawn(handle_connection(stream, addr, source, stats));
//! ```

pub mod handler;

// Re-export commonly used types
pub use handler::{
    handle_connection, ConnectionError, ConnectionHandler, ConnectionStats, Outcome,
    MAX_LINE_LENGTH,
};
