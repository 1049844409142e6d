//! The seam between the TCP surface and node flavors

use harbor_wire::{Request, Response};

/// Handles one parsed request, producing exactly one response
///
/// Implementations must not panic for any request content: every failure
/// maps to an error response so the connection survives (the generic
/// error kind of the protocol).
pub trait RequestHandler: Send + Sync + 'static {
    /// Produce the response for `request`
    fn handle(&self, request: &Request) -> Response;
}
