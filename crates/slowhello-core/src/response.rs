//! HTTP Response types

use bytes::{Bytes, BytesMut};
use smallvec::SmallVec;

/// HTTP Status Code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// Get the numeric code
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Get the reason phrase
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

/// HTTP Response
///
/// Headers are an ordered list of pairs, so one name may carry several
/// values.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code
    pub status: StatusCode,
    /// Response headers (stack-allocated for small header counts)
    pub headers: SmallVec<[(String, String); 8]>,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Create a new response
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: SmallVec::new(),
            body: Bytes::new(),
        }
    }

    /// Create a 200 OK response with no headers and no body
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Create a 404 Not Found response
    pub fn not_found() -> Self {
        let mut res = Self::new(StatusCode::NOT_FOUND);
        res.add_header("content-type", "text/plain");
        res.write("Not Found");
        res
    }

    /// Create a 500 response for a handler that never produced one
    pub fn internal_error() -> Self {
        let mut res = Self::new(StatusCode::INTERNAL_SERVER_ERROR);
        res.add_header("content-type", "text/plain");
        res.write("Internal Server Error");
        res
    }

    /// Append a header value, keeping any values already present
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Append bytes to the body
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) {
        let chunk = chunk.as_ref();
        if self.body.is_empty() {
            self.body = Bytes::copy_from_slice(chunk);
            return;
        }
        let mut buf = BytesMut::with_capacity(self.body.len() + chunk.len());
        buf.extend_from_slice(&self.body);
        buf.extend_from_slice(chunk);
        self.body = buf.freeze();
    }
}
