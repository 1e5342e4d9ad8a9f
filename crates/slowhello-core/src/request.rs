//! HTTP Request type

use http::Method;
use std::net::SocketAddr;

/// HTTP Request
///
/// Built by the listener for a single call and dropped once the response has
/// been produced. Only the request line and the peer address are kept; the
/// headers and body stay with hyper.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request path (without query string)
    pub path: String,
    /// Peer address of the connection the request arrived on
    pub remote_addr: SocketAddr,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>, remote_addr: SocketAddr) -> Self {
        Self {
            method,
            path: path.into(),
            remote_addr,
        }
    }
}
