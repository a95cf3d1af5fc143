//! Process signal wiring.
//!
//! - `SIGUSR1` toggles maintenance mode (via a tokio signal stream)
//! - `SIGPIPE` is ignored, so writing to a closed peer is an ordinary
//!   `BrokenPipe` error on that one connection
//! - `SIGTSTP` is ignored, so a stray Ctrl+Z does not freeze the server

use crate::control::maintenance::{describe, MaintenanceMode};
use std::io;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Sets `SIGPIPE` and `SIGTSTP` to `SIG_IGN` for the whole process.
pub fn ignore_process_signals() -> io::Result<()> {
    for sig in [libc::SIGPIPE, libc::SIGTSTP] {
        // SAFETY: SIG_IGN installs no handler code, only a disposition.
        let previous = unsafe { libc::signal(sig, libc::SIG_IGN) };
        if previous == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Registers for `SIGUSR1` and spawns the task that toggles `mode` on each
/// delivery.
///
/// Registration happens before this returns, so a failure here is a startup
/// error. Signals delivered in quick succession may be coalesced into one
/// toggle.
pub fn listen_for_toggle(mode: MaintenanceMode) -> io::Result<JoinHandle<()>> {
    let mut toggles = signal(SignalKind::user_defined1())?;

    Ok(tokio::spawn(async move {
        while toggles.recv().await.is_some() {
            let enabled = mode.toggle();
            info!(enabled, "Maintenance mode toggled to: {}", describe(enabled));
        }
        warn!("Maintenance signal stream closed");
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn wait_for(mode: &MaintenanceMode, expected: bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while mode.is_enabled() != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "maintenance flag never became {}",
                expected
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_sigusr1_toggles_maintenance() {
        let mode = MaintenanceMode::new();
        let listener = listen_for_toggle(mode.clone()).unwrap();

        // SAFETY: raising a signal we have a handler registered for.
        unsafe { libc::raise(libc::SIGUSR1) };
        wait_for(&mode, true).await;

        unsafe { libc::raise(libc::SIGUSR1) };
        wait_for(&mode, false).await;

        listener.abort();
    }

    #[test]
    fn test_ignored_signals_have_ign_disposition() {
        ignore_process_signals().unwrap();

        for sig in [libc::SIGPIPE, libc::SIGTSTP] {
            // SAFETY: querying the current action with a null new action.
            let current = unsafe {
                let mut action: libc::sigaction = std::mem::zeroed();
                assert_eq!(libc::sigaction(sig, std::ptr::null(), &mut action), 0);
                action.sa_sigaction
            };
            assert_eq!(current, libc::SIG_IGN);
        }
    }
}
