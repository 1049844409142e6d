//! Line-oriented socket I/O
//!
//! One JSON object per line in both directions. `roundtrip` is the
//! one-shot client primitive shared by the client library and the election
//! probe: connect, send one request, read one response, all bounded by a
//! single timeout.

use crate::message::{Request, Response};
use harbor_core::{Error, Result};
use serde::Serialize;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

/// Write one message as a `\n`-terminated JSON line and flush
pub fn write_message<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<()> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    writer.write_all(line.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Read one line; `Ok(None)` means the peer closed the connection
pub fn read_message_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    let read = reader.read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// One request, one response, over a fresh connection
///
/// The timeout bounds connect, send, and the response read independently.
pub fn roundtrip(addr: SocketAddr, request: &Request, timeout: Duration) -> Result<Response> {
    let stream = TcpStream::connect_timeout(&addr, timeout)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    let mut writer = stream.try_clone()?;
    write_message(&mut writer, request)?;

    let mut reader = BufReader::new(stream);
    match read_message_line(&mut reader)? {
        Some(line) => Ok(serde_json::from_str(&line)?),
        None => Err(Error::ConnectionClosed),
    }
}
