//! Error types for Harbor
//!
//! One error enum shared across the workspace. We use `thiserror` for
//! automatic `Display` and `Error` trait implementations.
//!
//! Wire-level error tokens (`not primary`, `missing key`, ...) are part of
//! the protocol contract and are produced by the server layer; this type
//! carries the internal failures that feed them.

use std::io;
use thiserror::Error;

/// Result type alias for Harbor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the Harbor store
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file operations, sockets)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error (WAL lines, snapshot, wire)
    #[error("codec error: {0}")]
    Codec(String),

    /// Mutating operation routed to a node that is not the primary
    #[error("not primary")]
    NotPrimary,

    /// Peer closed the connection before a full line arrived
    #[error("connection closed")]
    ConnectionClosed,

    /// The server answered a request with `ok:false`
    #[error("server error: {0}")]
    Remote(String),

    /// Cluster discovery found no node answering as primary
    #[error("no primary found in cluster")]
    NoPrimary,
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Codec(e.to_string())
    }
}

impl Error {
    /// Check whether this error is a `not primary` rejection
    ///
    /// Used by the cluster client to decide when to re-discover the
    /// primary and retry.
    pub fn is_not_primary(&self) -> bool {
        match self {
            Error::NotPrimary => true,
            Error::Remote(msg) => msg == "not primary",
            _ => false,
        }
    }

    /// Check whether this error came from the peer going away mid-request
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Error::ConnectionClosed) || matches!(self, Error::Io(_))
    }
}
