//! Wire protocol for Harbor
//!
//! Line-delimited JSON over TCP: each request is one JSON object terminated
//! by `\n`, each response likewise. Requests on one connection are handled
//! in order; connections are independent.
//!
//! The error tokens carried in responses (`missing key`, `invalid request`,
//! `not primary`, `unknown method: <m>`) are part of the protocol contract.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod io;
pub mod message;

pub use io::{read_message_line, roundtrip, write_message};
pub use message::{Request, Response};
