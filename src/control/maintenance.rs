//! The process-wide maintenance flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared handle to the maintenance flag. Clones see the same flag.
///
/// Reads are best-effort: a toggle racing with an accept may or may not be
/// observed by that connection.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceMode {
    enabled: Arc<AtomicBool>,
}

impl MaintenanceMode {
    /// A new flag, initially off.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Flips the flag and returns the new state.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn set(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}

/// "ON" / "OFF" for log lines.
pub fn describe(enabled: bool) -> &'static str {
    if enabled {
        "ON"
    } else {
        "OFF"
    }
}
