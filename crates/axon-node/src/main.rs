//! Axon node binary.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod bootstrap;
mod config;

use config::NodeConfig;

/// Axon network node.
#[derive(Parser, Debug)]
#[command(name = "axon-node")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "axon-node.toml")]
    config: PathBuf,

    /// Network to join
    #[arg(short, long, default_value = "devnet")]
    pub network: String,

    /// P2P bind address
    #[arg(long)]
    pub p2p_bind: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Axon node v{}", env!("CARGO_PKG_VERSION"));

    let config = NodeConfig::load(&args.config, &args)?;
    info!("Network: {}", config.network);
    info!("P2P: {}", config.p2p.bind_address);

    let ctx = bootstrap::build_context(&config)?;

    let service_config = axon_wire::ServiceConfig {
        listen_addr: config.p2p.bind_address.parse()?,
        max_frame_size: config.p2p.max_frame_size,
    };
    let service = axon_wire::NetworkService::new(service_config, ctx);

    tokio::select! {
        result = service.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
