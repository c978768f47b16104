//! Shared utilities for integration testing.
//!
//! Raw-socket mock upstreams: a fixed responder, a recording responder
//! that captures request lines, and a slow responder for timeout races.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        _ => "200 OK",
    }
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = vec![0u8; 8192];
    let mut head = Vec::new();
    loop {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                head.extend_from_slice(&buf[..n]);
                if head.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&head).to_string()
}

async fn write_response(
    socket: &mut tokio::net::TcpStream,
    status: u16,
    content_type: &str,
    body: &str,
) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text(status),
        content_type,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Start a mock upstream that returns a fixed response.
pub async fn start_mock_backend(
    addr: SocketAddr,
    status: u16,
    content_type: &'static str,
    body: &'static str,
) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        read_head(&mut socket).await;
                        write_response(&mut socket, status, content_type, body).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start a mock upstream that records every request line
/// (`GET /path?query HTTP/1.1`) before answering with a fixed response.
pub async fn start_recording_backend(
    addr: SocketAddr,
    status: u16,
    content_type: &'static str,
    body: &'static str,
) -> Arc<Mutex<Vec<String>>> {
    let listener = TcpListener::bind(addr).await.unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;
                        if let Some(line) = head.lines().next() {
                            recorded.lock().unwrap().push(line.to_string());
                        }
                        write_response(&mut socket, status, content_type, body).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    requests
}

/// Start a mock upstream that sleeps before answering; used to force the
/// decision-service timeout race.
pub async fn start_slow_backend(addr: SocketAddr, delay: Duration, body: &'static str) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        read_head(&mut socket).await;
                        tokio::time::sleep(delay).await;
                        write_response(&mut socket, 200, "application/json", body).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// A reqwest client that follows nothing and pools nothing, so redirect
/// responses are observable and test servers shut down cleanly.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
