//! Route table
//!
//! One pattern, one handler. Built once at start-up and shared read-only
//! with every connection task, so lookups take no locks.
//!
//! A pattern ending in `/` covers its whole subtree, so `/` catches every
//! path; any other pattern must match exactly.

use crate::{handler, Error, Request, Response, Result};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by a handler
pub type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Route handler type
pub type Handler = Arc<dyn Fn(Request) -> HandlerFuture + Send + Sync>;

/// Wrap an async fn as a [`Handler`]
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

/// Immutable `pattern -> handler` table
pub struct Routes {
    pattern: String,
    handler: Handler,
}

impl Routes {
    /// Bind `handler` to `pattern` for every method.
    pub fn new(pattern: impl Into<String>, handler: Handler) -> Result<Self> {
        let pattern = pattern.into();
        if !pattern.starts_with('/') {
            return Err(Error::InvalidPath(pattern));
        }
        Ok(Self { pattern, handler })
    }

    /// The table the server runs with: [`handler::hello`] on `/`.
    pub fn hello() -> Result<Self> {
        Self::new("/", handler_fn(handler::hello))
    }

    fn matches(&self, path: &str) -> bool {
        if self.pattern.ends_with('/') {
            path.starts_with(&self.pattern)
        } else {
            path == self.pattern
        }
    }

    /// Run the handler, or answer 404 when the path is outside the pattern
    /// (e.g. the `*` target of `OPTIONS *`).
    pub fn dispatch(&self, req: Request) -> HandlerFuture {
        if self.matches(&req.path) {
            (self.handler)(req)
        } else {
            Box::pin(async { Response::not_found() })
        }
    }
}
