//! TCP request surface for Harbor
//!
//! A thread-per-connection listener speaking the line-delimited JSON
//! protocol, decoupled from node flavor through the `RequestHandler`
//! trait. The standalone (single-node) handler lives here; the cluster
//! handlers implement the same trait in `harbor-cluster`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod handler;
pub mod server;
pub mod standalone;

pub use handler::RequestHandler;
pub use server::Server;
pub use standalone::Standalone;
