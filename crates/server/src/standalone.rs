//! Single-node request handler
//!
//! Every method runs against the local engine; there is no role concept
//! (`role` is a cluster method and falls through to the unknown-method
//! token here).

use crate::handler::RequestHandler;
use harbor_engine::KvEngine;
use harbor_wire::{Request, Response};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

const DEFAULT_TOP_K: usize = 10;

/// Handler for a standalone (non-replicated) server
pub struct Standalone {
    engine: Arc<KvEngine>,
}

impl Standalone {
    /// Wrap an engine
    pub fn new(engine: Arc<KvEngine>) -> Self {
        Standalone { engine }
    }

    /// The wrapped engine
    pub fn engine(&self) -> &Arc<KvEngine> {
        &self.engine
    }
}

impl RequestHandler for Standalone {
    fn handle(&self, request: &Request) -> Response {
        let sim_fail = request.debug_simulate_fail;
        match request.method.as_str() {
            "get" => match &request.key {
                None => Response::missing_key(),
                Some(key) => Response::with_optional_value(self.engine.get(key)),
            },
            "set" => match &request.key {
                None => Response::missing_key(),
                Some(key) => {
                    let value = request.value.clone().unwrap_or(json!(null));
                    match self.engine.set(key.clone(), value, sim_fail) {
                        Ok(()) => Response::ok(),
                        Err(err) => {
                            warn!(error = %err, "set failed");
                            Response::error(err.to_string())
                        }
                    }
                }
            },
            "delete" => match &request.key {
                None => Response::missing_key(),
                Some(key) => match self.engine.delete(key.clone(), sim_fail) {
                    Ok(()) => Response::ok(),
                    Err(err) => {
                        warn!(error = %err, "delete failed");
                        Response::error(err.to_string())
                    }
                },
            },
            "bulk_set" => match self.engine.bulk_set(request.items.clone(), sim_fail) {
                Ok(()) => Response::ok(),
                Err(err) => {
                    warn!(error = %err, "bulk_set failed");
                    Response::error(err.to_string())
                }
            },
            "search" => {
                let query = request.query.as_deref().unwrap_or_default();
                Response::with_value(json!(self.engine.search(query)))
            }
            "search_similar" => {
                let query = request.query.as_deref().unwrap_or_default();
                let top_k = request.top_k.unwrap_or(DEFAULT_TOP_K);
                Response::with_value(json!(self.engine.search_similar(query, top_k)))
            }
            other => Response::unknown_method(other),
        }
    }
}
