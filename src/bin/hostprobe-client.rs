//! hostprobe-client - fetch one report from a hostprobe server and print it.

use clap::Parser;
use hostprobe::client::{request, DEFAULT_URI};
use hostprobe::logging::LogConfig;
use hostprobe::{DEFAULT_HOST, DEFAULT_PORT};
use std::net::{IpAddr, SocketAddr};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "hostprobe-client", version, about = "Request a report from a hostprobe server", long_about = None)]
struct Cli {
    /// URI to request, e.g. /sysinfo
    uri: Option<String>,

    /// Server address
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: IpAddr,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    LogConfig::from_env().init();

    let uri = match cli.uri {
        Some(uri) => uri,
        None => {
            info!("Hint: No URI provided. Defaulting to {}", DEFAULT_URI);
            info!("Hint: Try running: hostprobe-client /sysinfo");
            DEFAULT_URI.to_string()
        }
    };

    let lines = request(SocketAddr::new(cli.host, cli.port), &uri).await?;

    println!("\n--- Server Response ---");
    for line in &lines {
        print!("{}", line);
    }
    println!("\n-------------------------");

    Ok(())
}
