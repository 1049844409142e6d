//! Masterless cluster node binary
//!
//! Every node accepts reads and writes; replication is broadcast to all
//! peers, converging last-writer-wins.

use anyhow::Result;
use clap::Parser;
use harborkv::{MasterlessConfig, MasterlessNode, Server};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// One node of a masterless Harbor cluster
#[derive(Parser, Debug)]
#[command(name = "harbor-masterless", version, about)]
struct Args {
    /// This node's id (used for logging)
    #[arg(long)]
    node_id: u32,

    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Client port
    #[arg(long)]
    kv_port: u16,

    /// Replication port this node listens on
    #[arg(long)]
    repl_port: u16,

    /// Replication ports of the other nodes
    #[arg(long, num_args = 1.., required = true)]
    peer_repl_ports: Vec<u16>,

    /// Data directory for this node
    #[arg(long)]
    data_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let addr = |port: u16| -> SocketAddr {
        format!("{}:{}", args.host, port)
            .parse()
            .expect("valid host/port")
    };

    let node = MasterlessNode::start(MasterlessConfig {
        node_id: args.node_id,
        repl_addr: addr(args.repl_port),
        peer_repl_addrs: args
            .peer_repl_ports
            .iter()
            .filter(|&&p| p != args.repl_port)
            .map(|&p| addr(p))
            .collect(),
        data_dir: args.data_dir.clone(),
    })?;
    node.connect_peers();

    let handler: Arc<dyn harborkv::RequestHandler> = node.clone();
    let server = Server::bind((args.host.as_str(), args.kv_port), handler)?;
    tracing::info!(
        node_id = args.node_id,
        addr = %server.local_addr(),
        "harbor-masterless running"
    );
    server.join();
    node.stop();
    Ok(())
}
