//! Single-server client
//!
//! One connection per request: connect, send one line, read one line. The
//! server's `ok:false` answers surface as `Error::Remote` carrying the
//! wire token.

use harbor_core::{Error, Result, Value};
use harbor_wire::{roundtrip, Request, Response};
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for one Harbor server
#[derive(Debug, Clone)]
pub struct KvClient {
    addr: SocketAddr,
    timeout: Duration,
}

impl KvClient {
    /// Client with the default request timeout
    pub fn new(addr: SocketAddr) -> Self {
        Self::with_timeout(addr, DEFAULT_TIMEOUT)
    }

    /// Client with a caller-chosen request timeout
    pub fn with_timeout(addr: SocketAddr, timeout: Duration) -> Self {
        KvClient { addr, timeout }
    }

    /// The server address this client talks to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn request(&self, request: &Request) -> Result<Response> {
        let response = roundtrip(self.addr, request, self.timeout)?;
        if !response.ok {
            return Err(Error::Remote(
                response.error.unwrap_or_else(|| "request failed".to_string()),
            ));
        }
        Ok(response)
    }

    /// Value for `key`; `None` when the key does not exist
    ///
    /// A stored JSON null and an absent key are distinguishable on the
    /// wire but both come back as `None` here, like the original client.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let response = self.request(&Request::get(key))?;
        Ok(response.value.filter(|v| !v.is_null()))
    }

    /// Upsert one pair
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        self.request(&Request::set(key, value))?;
        Ok(())
    }

    /// Upsert one pair, opting into snapshot-skip fault injection
    pub fn set_with_sim_fail(&self, key: &str, value: Value, sim_fail: bool) -> Result<()> {
        self.request(&Request::set(key, value).with_sim_fail(sim_fail))?;
        Ok(())
    }

    /// Remove one pair (absent keys succeed)
    pub fn delete(&self, key: &str) -> Result<()> {
        self.request(&Request::delete(key))?;
        Ok(())
    }

    /// Remove one pair, opting into snapshot-skip fault injection
    pub fn delete_with_sim_fail(&self, key: &str, sim_fail: bool) -> Result<()> {
        self.request(&Request::delete(key).with_sim_fail(sim_fail))?;
        Ok(())
    }

    /// Apply all pairs atomically; an empty list is a local no-op
    pub fn bulk_set(&self, items: Vec<(String, Value)>) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.request(&Request::bulk_set(items))?;
        Ok(())
    }

    /// Keys whose value contains every token of `query`
    pub fn search(&self, query: &str) -> Result<Vec<String>> {
        let response = self.request(&Request::search(query))?;
        match response.value {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Top-k `(key, score)` pairs by value similarity to `query`
    pub fn search_similar(&self, query: &str, top_k: usize) -> Result<Vec<(String, f64)>> {
        let response = self.request(&Request::search_similar(query, top_k))?;
        match response.value {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Ask the node's role (cluster nodes only)
    pub fn role(&self) -> Result<Response> {
        self.request(&Request::role())
    }
}
