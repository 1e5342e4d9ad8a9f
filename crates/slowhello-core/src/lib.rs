//! slowhello-core: delayed hello-world HTTP server
//!
//! Every request, whatever its method or path, is held for one second and
//! then answered with `Hello, world!\n` plus an `X-Remote-Addr` header
//! echoing the peer address the listener saw.
//!
//! ## Layout
//! - [`handler`] - the hello handler and its constants
//! - [`routes`] - the immutable route table built at start-up
//! - [`server`] - listener, per-connection tasks, hyper conversions

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod error;
pub mod handler;
pub mod request;
pub mod response;
pub mod routes;
pub mod server;

// Re-exports
pub use error::{Error, Result};
pub use handler::{hello, HELLO_BODY, HELLO_DELAY, X_REMOTE_ADDR};
pub use request::Request;
pub use response::{Response, StatusCode};
pub use routes::{handler_fn, Handler, HandlerFuture, Routes};
pub use server::{create_socket, from_hyper_request, to_hyper_response, Server, ServerConfig};
