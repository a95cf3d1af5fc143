//! Handler task supervision.
//!
//! Every connection handler runs as its own task inside a [`JoinSet`]. The
//! supervisor reclaims finished tasks so the set does not grow without bound
//! under sustained load, and turns a panicking handler into a log line
//! instead of letting it reach the acceptor.

use std::future::Future;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, trace};

/// Owns the set of outstanding handler tasks.
#[derive(Debug, Default)]
pub struct Supervisor {
    tasks: JoinSet<()>,
    reaped: u64,
    failed: u64,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` onto the runtime and tracks it.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Number of handler tasks not yet reaped.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Reclaims every task that has already finished, without waiting.
    ///
    /// Returns how many were reclaimed.
    pub fn reap(&mut self) -> usize {
        let mut count = 0;
        while let Some(result) = self.tasks.try_join_next() {
            self.record(result);
            count += 1;
        }
        if count > 0 {
            trace!(reaped = count, outstanding = self.tasks.len(), "Reaped handler tasks");
        }
        count
    }

    /// Waits for the next task to finish. Returns `None` when nothing is
    /// outstanding.
    pub async fn join_next(&mut self) -> Option<Result<(), JoinError>> {
        self.tasks.join_next().await
    }

    /// Accounts for one finished task, logging it if it failed.
    pub fn record(&mut self, result: Result<(), JoinError>) {
        self.reaped += 1;
        if let Err(e) = result {
            self.failed += 1;
            if e.is_panic() {
                error!(error = %e, "Connection handler panicked");
            } else {
                debug!(error = %e, "Connection handler cancelled");
            }
        }
    }

    /// Total tasks reclaimed so far.
    pub fn reaped(&self) -> u64 {
        self.reaped
    }

    /// Tasks that ended in a panic or cancellation.
    pub fn failed(&self) -> u64 {
        self.failed
    }
}
