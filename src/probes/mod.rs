//! Body Generators
//!
//! Each route's body comes from a host data source: a `/proc` file or the
//! single/multi-line output of a shell command. The server only sees the
//! [`BodySource`] trait, which keeps the connection handler testable with
//! fake sources and keeps the data sources themselves out of the request path.
//!
//! ## Failure Policy
//!
//! A generator never fails the request. When its source cannot be opened,
//! run or parsed, the body becomes `Error: <reason>` and the response is
//! still a 200. Clients distinguish success from failure only by the body.

pub mod system;

pub use system::{ProbeConfig, ProbeError, SystemProbes, MAX_BODY_SIZE};

use crate::routing::Route;

/// Produces the body text for a route.
///
/// Implementations may block (file reads, child processes); the connection
/// handler calls them from tokio's blocking pool.
pub trait BodySource: Send + Sync + 'static {
    fn fetch(&self, route: Route) -> String;
}
