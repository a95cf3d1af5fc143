//! hostprobe - A Minimal Host-Introspection Responder
//!
//! This is the main entry point for the hostprobe server.
//! It sets up logging, process signals and the listener, then runs the
//! accept loop until the process is killed.

use clap::Parser;
use hostprobe::control::{ignore_process_signals, listen_for_toggle, MaintenanceMode};
use hostprobe::logging::LogConfig;
use hostprobe::probes::{ProbeConfig, SystemProbes};
use hostprobe::server::{Server, ServerConfig, DEFAULT_BACKLOG, DEFAULT_PORT};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing::{error, info};

/// Serves host memory, kernel, load, time and disk reports over HTTP.
///
/// Send SIGUSR1 to toggle maintenance mode. Set HOSTPROBE_DEBUG=0|1|2 for
/// log verbosity.
#[derive(Parser, Debug)]
#[command(name = "hostprobe", version, about, long_about = None)]
struct Cli {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Listen backlog
    #[arg(long, default_value_t = DEFAULT_BACKLOG)]
    backlog: u32,

    /// Time zone used by /time
    #[arg(long, default_value = "Asia/Taipei")]
    time_zone: String,

    /// Memory statistics file used by /raminfo
    #[arg(long, default_value = "/proc/meminfo")]
    meminfo: PathBuf,

    /// Load average file used by /loadavg
    #[arg(long, default_value = "/proc/loadavg")]
    loadavg: PathBuf,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_address: SocketAddr::new(self.host, self.port),
            backlog: self.backlog,
        }
    }

    fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            meminfo_path: self.meminfo.clone(),
            loadavg_path: self.loadavg.clone(),
            time_zone: self.time_zone.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    LogConfig::from_env().init();

    let config = cli.server_config();

    if let Err(e) = ignore_process_signals() {
        error!(error = %e, "Failed to set signal dispositions");
        return Err(e.into());
    }

    // Registered before the socket exists so an early SIGUSR1 cannot kill us.
    let maintenance = MaintenanceMode::new();
    if let Err(e) = listen_for_toggle(maintenance.clone()) {
        error!(error = %e, "Failed to register SIGUSR1 handler");
        return Err(e.into());
    }

    let probes = SystemProbes::new(cli.probe_config());
    let server = match Server::bind_with(&config, probes, maintenance) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    info!(
        address = %config.bind_address,
        pid = std::process::id(),
        version = hostprobe::VERSION,
        "Server started, waiting for connections"
    );

    server.run().await;
    Ok(())
}
