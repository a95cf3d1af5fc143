//! Robust Byte-Stream I/O
//!
//! Primitives that hide partial transfers and interrupted system calls from
//! the rest of the server. Callers only ever see three outcomes:
//!
//! - a complete unit of work (a line, or the whole buffer written)
//! - a clean end of stream (`Ok(0)` from [`read_line`])
//! - an unrecoverable I/O error
//!
//! ```text
//!   socket ──► read_line ──► Connection Handler ──► send_response ──► write_all ──► socket
//!               │                                                       │
//!               └── retries Interrupted                                 └── retries Interrupted,
//!                                                                           loops on short writes
//! ```

pub mod robust;

pub use robust::{read_line, write_all};
