//! End-to-end tests over real TCP connections

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1::{handshake, SendRequest};
use hyper_util::rt::TokioIo;
use slowhello_core::{
    handler_fn, hello, Request, Routes, Server, ServerConfig, HELLO_BODY, HELLO_DELAY,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

struct Reply {
    status: u16,
    remote_addr: Vec<String>,
    content_type: Option<String>,
    body: Bytes,
}

async fn start_server() -> SocketAddr {
    serve(Routes::hello().unwrap()).await
}

async fn serve(routes: Routes) -> SocketAddr {
    let config = ServerConfig::new().hostname("127.0.0.1").port(0);
    let server = Server::bind(&config, routes).unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

/// Open a client connection, returning the sender and the client's own address
async fn connect(addr: SocketAddr) -> (SendRequest<Full<Bytes>>, SocketAddr) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let local = stream.local_addr().unwrap();
    let (sender, conn) = handshake(TokioIo::new(stream)).await.unwrap();
    tokio::spawn(conn);
    (sender, local)
}

async fn send(
    sender: &mut SendRequest<Full<Bytes>>,
    method: &str,
    path: &str,
    payload: &'static [u8],
) -> Reply {
    let req = hyper::Request::builder()
        .method(method)
        .uri(path)
        .header("host", "localhost")
        .body(Full::new(Bytes::from_static(payload)))
        .unwrap();

    let res = sender.send_request(req).await.unwrap();
    let (parts, body) = res.into_parts();

    Reply {
        status: parts.status.as_u16(),
        remote_addr: parts
            .headers
            .get_all("x-remote-addr")
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect(),
        content_type: parts
            .headers
            .get("content-type")
            .map(|v| v.to_str().unwrap().to_string()),
        body: body.collect().await.unwrap().to_bytes(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_root() {
    let addr = start_server().await;
    let (mut sender, local) = connect(addr).await;

    let start = Instant::now();
    let reply = send(&mut sender, "GET", "/", b"").await;

    assert!(start.elapsed() >= HELLO_DELAY);
    assert_eq!(reply.status, 200);
    assert_eq!(reply.remote_addr, vec![local.to_string()]);
    assert_eq!(reply.content_type, None);
    assert_eq!(&reply.body[..], b"Hello, world!\n");
    assert_eq!(reply.body.len(), 14);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_every_method_and_path_gets_same_reply() {
    let addr = start_server().await;

    let mut tasks = Vec::new();
    for (method, path) in [
        ("GET", "/"),
        ("POST", "/"),
        ("PUT", "/"),
        ("DELETE", "/"),
        ("PATCH", "/users/42"),
        ("OPTIONS", "/a/b/c"),
        ("GET", "/?q=1"),
    ] {
        tasks.push(tokio::spawn(async move {
            let (mut sender, local) = connect(addr).await;
            (send(&mut sender, method, path, b"ignored payload").await, local)
        }));
    }

    for task in tasks {
        let (reply, local) = task.await.unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(reply.remote_addr, vec![local.to_string()]);
        assert_eq!(&reply.body[..], HELLO_BODY);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_requests_do_not_serialize() {
    let addr = start_server().await;
    let (mut a, local_a) = connect(addr).await;
    let (mut b, local_b) = connect(addr).await;

    let start = Instant::now();
    let (ra, rb) = tokio::join!(send(&mut a, "GET", "/", b""), send(&mut b, "GET", "/", b""));
    let elapsed = start.elapsed();

    assert!(elapsed >= HELLO_DELAY);
    assert!(elapsed < HELLO_DELAY + Duration::from_millis(800));

    assert_eq!(ra.remote_addr, vec![local_a.to_string()]);
    assert_eq!(rb.remote_addr, vec![local_b.to_string()]);
    assert_ne!(local_a, local_b);
    assert_eq!(&ra.body[..], HELLO_BODY);
    assert_eq!(&rb.body[..], HELLO_BODY);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_keep_alive_reuses_connection() {
    let addr = start_server().await;
    let (mut sender, local) = connect(addr).await;

    let first = send(&mut sender, "GET", "/", b"").await;
    let second = send(&mut sender, "POST", "/again", b"").await;

    assert_eq!(first.remote_addr, vec![local.to_string()]);
    assert_eq!(second.remote_addr, vec![local.to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wire_format() {
    let addr = start_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let local = stream.local_addr().unwrap();

    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8(raw).unwrap();

    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains(&format!("\r\nX-Remote-Addr: {local}\r\n")));
    assert!(text.contains("\r\nContent-Length: 14\r\n"));
    assert!(!text.to_ascii_lowercase().contains("content-type"));
    assert!(text.ends_with("\r\n\r\nHello, world!\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_client_disconnect_does_not_affect_others() {
    let addr = start_server().await;

    // Abandon a request mid-delay
    let mut dropped = TcpStream::connect(addr).await.unwrap();
    dropped
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    drop(dropped);

    let (mut sender, local) = connect(addr).await;
    let reply = send(&mut sender, "GET", "/", b"").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.remote_addr, vec![local.to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_handler_finishes_after_client_hangs_up() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();
    let routes = Routes::new(
        "/",
        handler_fn(move |req: Request| {
            let flag = flag.clone();
            async move {
                let res = hello(req).await;
                flag.store(true, Ordering::SeqCst);
                res
            }
        }),
    )
    .unwrap();
    let addr = serve(routes).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(stream);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(finished.load(Ordering::SeqCst));
}
