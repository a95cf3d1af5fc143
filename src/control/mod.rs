//! Runtime Control
//!
//! Everything that changes or observes the server from outside the request
//! path:
//!
//! ```text
//!   kill -USR1 <pid>
//!         │
//!         ▼
//!   ┌──────────────────┐   toggle()   ┌──────────────────┐  is_enabled()  ┌──────────────┐
//!   │ toggle listener  │─────────────>│ MaintenanceMode  │<───────────────│ Acceptor     │
//!   │ (tokio task)     │              │ (AtomicBool)     │                │ loop         │
//!   └──────────────────┘              └──────────────────┘                └──────┬───────┘
//!                                                                                │ spawn
//!                                                                                ▼
//!                                     ┌──────────────────┐   join_next()  ┌──────────────┐
//!                                     │ Supervisor       │<───────────────│ handler      │
//!                                     │ (JoinSet reaper) │                │ tasks        │
//!                                     └──────────────────┘                └──────────────┘
//! ```
//!
//! The OS-level signal handler installed by tokio only wakes the listener
//! task. Flag updates and logging happen in ordinary task context.

pub mod maintenance;
pub mod signals;
pub mod supervisor;

pub use maintenance::MaintenanceMode;
pub use signals::{ignore_process_signals, listen_for_toggle};
pub use supervisor::Supervisor;
