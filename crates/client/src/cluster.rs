//! Primary-following client for a primary/secondary cluster
//!
//! Discovers the primary by asking every known client port for its role,
//! caches the answer, and sends all requests there. When the cached
//! primary rejects with `not primary` or stops answering, the cache is
//! cleared, discovery runs once more (an election may be in flight, so
//! discovery itself retries for a few seconds), and the request is
//! retried once.

use harbor_core::{Error, Result, Value};
use harbor_wire::{roundtrip, Request, Response};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DISCOVER_ATTEMPTS: usize = 10;
const DISCOVER_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const DISCOVER_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Client that follows the cluster's primary
pub struct ClusterClient {
    client_addrs: Vec<SocketAddr>,
    timeout: Duration,
    primary: Mutex<Option<SocketAddr>>,
}

impl ClusterClient {
    /// Client over the cluster's known client endpoints
    pub fn new(client_addrs: Vec<SocketAddr>) -> Self {
        Self::with_timeout(client_addrs, DEFAULT_TIMEOUT)
    }

    /// Client with a caller-chosen request timeout
    pub fn with_timeout(client_addrs: Vec<SocketAddr>, timeout: Duration) -> Self {
        ClusterClient {
            client_addrs,
            timeout,
            primary: Mutex::new(None),
        }
    }

    /// Probe every node for its role until one answers as primary
    ///
    /// Retries for a few seconds to ride out node startup and elections.
    fn discover_primary(&self) -> Result<SocketAddr> {
        for attempt in 0..DISCOVER_ATTEMPTS {
            for &addr in &self.client_addrs {
                let response = match roundtrip(addr, &Request::role(), DISCOVER_PROBE_TIMEOUT) {
                    Ok(response) => response,
                    Err(_) => continue,
                };
                if response.primary == Some(true) {
                    info!(primary = %addr, attempt, "primary discovered");
                    return Ok(addr);
                }
            }
            std::thread::sleep(DISCOVER_RETRY_DELAY);
        }
        Err(Error::NoPrimary)
    }

    fn primary_addr(&self) -> Result<SocketAddr> {
        let mut cached = self.primary.lock();
        if let Some(addr) = *cached {
            return Ok(addr);
        }
        let addr = self.discover_primary()?;
        *cached = Some(addr);
        Ok(addr)
    }

    fn forget_primary(&self) {
        *self.primary.lock() = None;
    }

    fn request(&self, request: &Request) -> Result<Response> {
        match self.request_once(request) {
            Ok(response) => Ok(response),
            // The cached primary is stale (demoted answer or gone node):
            // re-discover once and retry the request once.
            Err(err) if err.is_not_primary() || err.is_disconnect() => {
                debug!(error = %err, "primary stale; re-discovering");
                self.forget_primary();
                self.request_once(request)
            }
            Err(err) => Err(err),
        }
    }

    fn request_once(&self, request: &Request) -> Result<Response> {
        let addr = self.primary_addr()?;
        let response = roundtrip(addr, request, self.timeout)?;
        if !response.ok {
            return Err(Error::Remote(
                response.error.unwrap_or_else(|| "request failed".to_string()),
            ));
        }
        Ok(response)
    }

    /// Value for `key`; `None` when the key does not exist
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let response = self.request(&Request::get(key))?;
        Ok(response.value.filter(|v| !v.is_null()))
    }

    /// Upsert one pair on the primary
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        self.request(&Request::set(key, value))?;
        Ok(())
    }

    /// Remove one pair on the primary
    pub fn delete(&self, key: &str) -> Result<()> {
        self.request(&Request::delete(key))?;
        Ok(())
    }

    /// Apply all pairs atomically on the primary
    pub fn bulk_set(&self, items: Vec<(String, Value)>) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.request(&Request::bulk_set(items))?;
        Ok(())
    }

    /// The currently cached primary, if any
    pub fn cached_primary(&self) -> Option<SocketAddr> {
        *self.primary.lock()
    }
}
