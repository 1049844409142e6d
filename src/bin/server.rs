//! Standalone server binary

use anyhow::Result;
use clap::Parser;
use harborkv::{EngineConfig, KvEngine, Server, Standalone};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Durable key-value store server (single node)
#[derive(Parser, Debug)]
#[command(name = "harbor-server", version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Client port
    #[arg(long, default_value_t = 9999)]
    port: u16,

    /// Data directory for the WAL and snapshot
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Probability that a debug_simulate_fail mutation skips its snapshot
    #[arg(long, default_value_t = 0.0)]
    debug_fail_chance: f64,

    /// Maintain the full-text and similarity value indexes
    #[arg(long)]
    enable_indexes: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let engine = KvEngine::open(
        EngineConfig::new(&args.data_dir)
            .with_snapshot_skip_chance(args.debug_fail_chance)
            .with_indexes(args.enable_indexes),
    )?;

    let server = Server::bind(
        (args.host.as_str(), args.port),
        Arc::new(Standalone::new(Arc::new(engine))),
    )?;
    tracing::info!(addr = %server.local_addr(), "harbor-server running");
    server.join();
    Ok(())
}
