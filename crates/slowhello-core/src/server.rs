//! Native HTTP server implementation
//!
//! Plain HTTP/1.1 on hyper:
//! - One tokio task per accepted connection
//! - One more task per request, so a client hang-up never cuts a handler short
//! - Route table shared read-only behind an `Arc`

use crate::{Error, Request, Response, Result, Routes};
use bytes::Bytes;
use http::{HeaderName, HeaderValue};
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn, Instrument};

/// First pause after a failed `accept`
pub const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(5);

/// Longest pause between `accept` retries
pub const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Server configuration
///
/// Values are fixed in code; nothing is read from flags or the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub hostname: String,
    pub port: u16,
    /// Runtime worker threads
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "0.0.0.0".to_string(),
            port: 5000,
            workers: num_cpus::get(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Socket address to listen on
    pub fn addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .hostname
            .parse()
            .map_err(|_| Error::InvalidAddress(self.hostname.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Create a listening TCP socket
pub fn create_socket(addr: &SocketAddr) -> std::io::Result<Socket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // Allow binding to an address still in TIME_WAIT
    socket.set_reuse_address(true)?;
    // Inherited by accepted streams
    socket.set_nodelay(true)?;
    socket.set_nonblocking(true)?;

    socket.bind(&(*addr).into())?;
    socket.listen(1024)?;

    Ok(socket)
}

/// A bound listener plus the route table it serves
pub struct Server {
    listener: TcpListener,
    routes: Arc<Routes>,
}

impl Server {
    /// Bind the configured address.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn bind(config: &ServerConfig, routes: Routes) -> Result<Self> {
        let addr = config.addr()?;
        let socket = create_socket(&addr).map_err(|source| Error::Bind { addr, source })?;
        let listener = TcpListener::from_std(socket.into())
            .map_err(|source| Error::Bind { addr, source })?;

        Ok(Self {
            listener,
            routes: Arc::new(routes),
        })
    }

    /// Address the listener actually bound (resolves port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever
    ///
    /// A failed `accept` (EMFILE and friends) is retried after a pause that
    /// doubles from [`ACCEPT_BACKOFF_MIN`] up to [`ACCEPT_BACKOFF_MAX`].
    pub async fn run(self) -> Result<()> {
        let Server { listener, routes } = self;
        info!(addr = %listener.local_addr()?, "listening");

        let mut backoff = None;
        loop {
            match listener.accept().await {
                Ok((stream, remote_addr)) => {
                    backoff = None;
                    let span = tracing::debug_span!("connection", %remote_addr);
                    tokio::spawn(
                        serve_connection(stream, remote_addr, routes.clone()).instrument(span),
                    );
                }
                Err(e) => {
                    let delay = next_backoff(backoff);
                    backoff = Some(delay);
                    warn!(error = %e, ?delay, "accept failed, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn next_backoff(previous: Option<Duration>) -> Duration {
    match previous {
        None => ACCEPT_BACKOFF_MIN,
        Some(d) => (d * 2).min(ACCEPT_BACKOFF_MAX),
    }
}

async fn serve_connection(stream: TcpStream, remote_addr: SocketAddr, routes: Arc<Routes>) {
    debug!("connection accepted");

    let io = TokioIo::new(stream);
    let service = service_fn(move |req| handle_request(routes.clone(), req, remote_addr));

    // Client hang-ups land here; nothing is retried
    if let Err(e) = http1::Builder::new()
        .title_case_headers(true)
        .serve_connection(io, service)
        .await
    {
        debug!(error = %e, "connection closed with error");
    }
}

async fn handle_request<B>(
    routes: Arc<Routes>,
    req: hyper::Request<B>,
    remote_addr: SocketAddr,
) -> std::result::Result<hyper::Response<Full<Bytes>>, Infallible> {
    let request = from_hyper_request(&req, remote_addr);
    debug!(method = %request.method, path = %request.path, "request");

    // hyper drops this future if the peer goes away; the spawned handler
    // keeps running to completion regardless
    let handler = tokio::spawn(routes.dispatch(request).in_current_span());
    let response = match handler.await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "handler task failed");
            Response::internal_error()
        }
    };

    debug!(status = %response.status, "response");
    Ok(to_hyper_response(response))
}

/// Convert a hyper request head to our Request type
pub fn from_hyper_request<B>(req: &hyper::Request<B>, remote_addr: SocketAddr) -> Request {
    Request::new(req.method().clone(), req.uri().path(), remote_addr)
}

/// Convert our Response to a hyper Response
///
/// Headers that are not valid HTTP are dropped with a warning.
pub fn to_hyper_response(res: Response) -> hyper::Response<Full<Bytes>> {
    let mut response = hyper::Response::new(Full::new(res.body));
    *response.status_mut() = http::StatusCode::from_u16(res.status.as_u16())
        .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

    for (name, value) in &res.headers {
        match header_pair(name, value) {
            Ok((name, value)) => {
                response.headers_mut().append(name, value);
            }
            Err(e) => warn!(error = %e, "dropping response header"),
        }
    }

    response
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| Error::InvalidHeader(name.to_string()))?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| Error::InvalidHeader(format!("{name}: {value}")))?;
    Ok((name, value))
}
