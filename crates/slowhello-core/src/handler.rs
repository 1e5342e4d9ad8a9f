//! The delayed hello handler

use crate::{Request, Response};
use std::time::Duration;

/// How long every request is held before it is answered
pub const HELLO_DELAY: Duration = Duration::from_secs(1);

/// Header carrying the caller's address back to it
pub const X_REMOTE_ADDR: &str = "X-Remote-Addr";

/// Fixed response body
pub const HELLO_BODY: &[u8] = b"Hello, world!\n";

/// Answer any request with [`HELLO_BODY`] after [`HELLO_DELAY`].
///
/// The sleep parks only this request's task. Status and content type are
/// left at their defaults.
pub async fn hello(req: Request) -> Response {
    tokio::time::sleep(HELLO_DELAY).await;

    let mut res = Response::ok();
    res.add_header(X_REMOTE_ADDR, req.remote_addr.to_string());
    res.write(HELLO_BODY);
    res
}
