//! Accept loop and per-connection workers
//!
//! One detached thread per accepted connection. Requests on a connection
//! are answered in order; a line that fails to parse gets the
//! `invalid request` token and the connection stays open. Client reads
//! have no server-side deadline; a worker blocks until its client closes.
//!
//! The accept loop polls a stop flag between accepts (well under the
//! half-second observation bound), so `stop` brings the listener down
//! promptly without tearing out live connections.

use crate::handler::RequestHandler;
use harbor_core::Result;
use harbor_wire::{read_message_line, write_message, Request, Response};
use std::io::{BufReader, ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// A running TCP listener bound to one handler
pub struct Server {
    local_addr: SocketAddr,
    stop: Arc<AtomicBool>,
    accept_thread: Option<JoinHandle<()>>,
}

impl Server {
    /// Bind `addr` and start accepting connections
    ///
    /// Bind to port 0 to let the OS pick; the chosen port is available via
    /// `local_addr` before any connection is accepted.
    pub fn bind(addr: impl ToSocketAddrs, handler: Arc<dyn RequestHandler>) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        let stop = Arc::new(AtomicBool::new(false));

        let accept_thread = {
            let stop = Arc::clone(&stop);
            thread::spawn(move || accept_loop(listener, handler, stop))
        };

        info!(addr = %local_addr, "server listening");
        Ok(Server {
            local_addr,
            stop,
            accept_thread: Some(accept_thread),
        })
    }

    /// The bound address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and join the accept loop
    ///
    /// Live connection workers are detached; they end when their clients
    /// hang up.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
        info!(addr = %self.local_addr, "server stopped");
    }

    /// Block until the server is stopped from another thread
    pub fn join(mut self) {
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
    }
}

fn accept_loop(listener: TcpListener, handler: Arc<dyn RequestHandler>, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "connection accepted");
                let handler = Arc::clone(&handler);
                thread::spawn(move || {
                    if let Err(err) = serve_connection(stream, handler.as_ref()) {
                        debug!(%peer, error = %err, "connection ended");
                    }
                });
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(err) => {
                warn!(error = %err, "accept failed");
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

fn serve_connection(stream: TcpStream, handler: &dyn RequestHandler) -> Result<()> {
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    while let Some(line) = read_message_line(&mut reader)? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handler.handle(&request),
            Err(_) => Response::invalid_request(),
        };
        write_message(&mut writer, &response)?;
    }
    writer.flush()?;
    Ok(())
}
