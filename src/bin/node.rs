//! Primary/secondary cluster node binary
//!
//! Node 0 starts as primary. The peer port lists describe the *other*
//! nodes; a node's own ports may appear in them and are filtered out.

use anyhow::Result;
use clap::Parser;
use harborkv::{ClusterConfig, ClusterNode, Server};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// One node of a primary/secondary Harbor cluster
#[derive(Parser, Debug)]
#[command(name = "harbor-node", version, about)]
struct Args {
    /// This node's id; node 0 starts as primary
    #[arg(long)]
    node_id: u32,

    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Client port
    #[arg(long)]
    kv_port: u16,

    /// Replication port (listened on while secondary)
    #[arg(long)]
    repl_port: u16,

    /// Replication ports of the secondaries (dialed when primary)
    #[arg(long, num_args = 1.., required = true)]
    peer_repl_ports: Vec<u16>,

    /// Client ports of all nodes (probed during elections)
    #[arg(long, num_args = 1.., required = true)]
    peer_kv_ports: Vec<u16>,

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

    let config = ClusterConfig::new(
        args.node_id,
        addr(args.repl_port),
        args.peer_repl_ports
            .iter()
            .filter(|&&p| p != args.repl_port)
            .map(|&p| addr(p))
            .collect(),
        args.peer_kv_ports
            .iter()
            .filter(|&&p| p != args.kv_port)
            .map(|&p| addr(p))
            .collect(),
        &args.data_dir,
    );

    let node = ClusterNode::start(config)?;
    let handler: Arc<dyn harborkv::RequestHandler> = node.clone();
    let server = Server::bind((args.host.as_str(), args.kv_port), handler)?;
    tracing::info!(
        node_id = args.node_id,
        addr = %server.local_addr(),
        "harbor-node running"
    );
    server.join();
    node.stop();
    Ok(())
}
