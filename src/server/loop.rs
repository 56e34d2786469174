// Server loop module
// Accepts connections forever and hands each one to its own task

use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Accept loop. Never returns; a failed accept is logged and the loop goes on.
pub async fn start_server_loop(listener: TcpListener, state: Arc<AppState>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
            Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handler::builtin;
    use crate::server::create_listener;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn spawn_server() -> SocketAddr {
        let mut cfg = Config::load_from("definitely/not/a/config/file").unwrap();
        cfg.logging.access_log = false;
        let state = Arc::new(AppState::new(&cfg));

        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(start_server_loop(listener, state));
        addr
    }

    async fn request(addr: SocketAddr, raw: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw).await.unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_serves_each_builtin_route() {
        let addr = spawn_server().await;

        assert_eq!(request(addr, b"GET / HTTP/1.1\r\n\r\n").await, builtin::root(""));
        assert_eq!(request(addr, b"GET /about HTTP/1.1\r\n\r\n").await, builtin::about(""));
        assert_eq!(request(addr, b"GET /api/data HTTP/1.1\r\n\r\n").await, builtin::api_data(""));
        assert_eq!(request(addr, b"GET /nope HTTP/1.1\r\n\r\n").await, builtin::not_found(""));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_connections() {
        let addr = spawn_server().await;
        let cases = [
            ("/", builtin::root("")),
            ("/about", builtin::about("")),
            ("/api/data", builtin::api_data("")),
            ("/missing", builtin::not_found("")),
        ];

        let mut tasks = Vec::new();
        for round in 0..8 {
            for (path, expected) in &cases {
                let raw = format!("GET {path} HTTP/1.1\r\nX-Round: {round}\r\n\r\n");
                let expected = expected.clone();
                tasks.push(tokio::spawn(async move {
                    let got = request(addr, raw.as_bytes()).await;
                    assert_eq!(got, expected);
                }));
            }
        }

        for task in tasks {
            task.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_stalled_client_does_not_block_others() {
        let addr = spawn_server().await;

        // Holds its connection open without ever finishing the head
        let mut stalled = TcpStream::connect(addr).await.unwrap();
        stalled.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();

        assert_eq!(request(addr, b"GET /about HTTP/1.1\r\n\r\n").await, builtin::about(""));
        drop(stalled);
    }

    #[tokio::test]
    async fn test_malformed_requests_do_not_stop_server() {
        let addr = spawn_server().await;

        // No request line to speak of: resolves to the empty path
        let out = request(addr, b"\r\n\r\n").await;
        assert!(out.starts_with("HTTP/1.1 404 Not Found\r\n"));

        // Closed before the header terminator: no response at all
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"garbage without terminator").await.unwrap();
        stream.shutdown().await.unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        assert!(out.is_empty());

        assert_eq!(request(addr, b"GET / HTTP/1.1\r\n\r\n").await, builtin::root(""));
    }
}
