// Connection handling module
// One request per connection: read the head, dispatch, write, close

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::AppState;
use crate::http::{self, Request};
use crate::logger::{self, AccessLogEntry};

const READ_CHUNK_SIZE: usize = 4096;

/// Log the new connection and hand it to its own task.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
) {
    if state.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, peer_addr, Arc::clone(state));
}

/// Serve a connection in a detached task.
///
/// Errors stop at the task boundary: they are logged and the connection is
/// dropped without a response.
fn handle_connection(stream: tokio::net::TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    tokio::spawn(async move {
        if let Err(err) = serve_connection(stream, peer_addr, &state).await {
            logger::log_connection_error(&peer_addr, &err);
        }
    });
}

/// Read one request from `stream`, answer it, and give the stream back to be
/// dropped.
pub async fn serve_connection<S>(
    mut stream: S,
    peer_addr: SocketAddr,
    state: &AppState,
) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let started = Instant::now();

    let mut buf = Vec::with_capacity(READ_CHUNK_SIZE);
    read_request_head(&mut stream, &mut buf).await?;

    let request = Request::parse(&buf);
    logger::log_headers_count(request.header_count, state.logging.show_headers);

    let response = state.routes.dispatch(&request.path, &request.body);

    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;

    if state.logging.access_log {
        let mut entry = AccessLogEntry::new(peer_addr.to_string(), request.method, request.path);
        entry.http_version = request.http_version;
        entry.status = http::response::status_code(&response).unwrap_or_default();
        entry.body_bytes = http::response::body_len(&response);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.logging.access_log_format);
    }

    Ok(())
}

/// Read from `reader` into `buf` until the buffer holds the header terminator.
///
/// Bytes past the terminator that arrived in the same reads stay in `buf`.
/// Nothing more is read after the terminator is seen, so a body split over
/// later segments is cut short. EOF before the terminator is `UnexpectedEof`.
pub async fn read_request_head<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let mut scanned: usize = 0;

    loop {
        // Resume the scan a few bytes back so a terminator split across reads is found
        let from = scanned.saturating_sub(http::request::HEADER_TERMINATOR.len() - 1);
        if http::find_header_end(&buf[from..]).is_some() {
            return Ok(());
        }
        scanned = buf.len();

        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before end of headers",
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handler::builtin;
    use tokio::io::duplex;

    fn test_state() -> AppState {
        let mut cfg = Config::load_from("definitely/not/a/config/file").unwrap();
        cfg.logging.access_log = false;
        AppState::new(&cfg)
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    async fn exchange(request: &[u8]) -> std::io::Result<Vec<u8>> {
        let (mut client, server) = duplex(64 * 1024);
        let state = test_state();
        client.write_all(request).await?;

        serve_connection(server, peer(), &state).await?;

        let mut out = Vec::new();
        client.read_to_end(&mut out).await?;
        Ok(out)
    }

    #[tokio::test]
    async fn test_read_head_single_chunk() {
        let mut input: &[u8] = b"GET / HTTP/1.1\r\nHost: x\r\n\r\nbody";
        let mut buf = Vec::new();
        read_request_head(&mut input, &mut buf).await.unwrap();
        assert_eq!(buf, b"GET / HTTP/1.1\r\nHost: x\r\n\r\nbody");
    }

    #[tokio::test]
    async fn test_read_head_split_terminator() {
        let (mut client, mut server) = duplex(1024);
        let reader = tokio::spawn(async move {
            let mut buf = Vec::new();
            read_request_head(&mut server, &mut buf).await.map(|()| buf)
        });

        for part in [&b"GET /about HT"[..], b"TP/1.1\r\n\r", b"\n"] {
            client.write_all(part).await.unwrap();
            tokio::task::yield_now().await;
        }

        let buf = reader.await.unwrap().unwrap();
        assert_eq!(buf, b"GET /about HTTP/1.1\r\n\r\n");
    }

    #[tokio::test]
    async fn test_read_head_eof_before_terminator() {
        let mut input: &[u8] = b"GET / HTTP/1.1\r\nHost: x\r\n";
        let mut buf = Vec::new();
        let err = read_request_head(&mut input, &mut buf).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_serve_root() {
        let out = exchange(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
        assert_eq!(out, builtin::root("").into_bytes());
    }

    #[tokio::test]
    async fn test_serve_about_keeps_declared_length() {
        let out = String::from_utf8(exchange(b"GET /about HTTP/1.1\r\n\r\n").await.unwrap()).unwrap();
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(out.contains("Content-Length: 17\r\n"));
        assert!(out.ends_with("This is the about page."));
    }

    #[tokio::test]
    async fn test_serve_api_data() {
        let out = String::from_utf8(exchange(b"GET /api/data HTTP/1.1\r\n\r\n").await.unwrap()).unwrap();
        assert!(out.contains("Content-Type: application/json\r\n"));
        assert!(out.ends_with(r#"{"message": "Data"}"#));
    }

    #[tokio::test]
    async fn test_serve_unknown_path() {
        let out = String::from_utf8(exchange(b"GET /nope HTTP/1.1\r\n\r\n").await.unwrap()).unwrap();
        assert!(out.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(out.ends_with("Not Found\r\n"));
    }

    #[tokio::test]
    async fn test_serve_ignores_method_and_headers() {
        let out = exchange(b"POST /api/data HTTP/1.0\r\nHost: a\r\nContent-Length: 4\r\n\r\nabcd")
            .await
            .unwrap();
        assert_eq!(out, builtin::api_data("").into_bytes());
    }

    #[tokio::test]
    async fn test_body_reaches_handler() {
        fn echo(body: &str) -> String {
            crate::http::build_response(200, "text/plain", body)
        }

        let mut cfg = Config::load_from("definitely/not/a/config/file").unwrap();
        cfg.logging.access_log = false;
        let routes = crate::handler::RouteTable::new(builtin::not_found).route("/echo", echo);
        let state = AppState::with_routes(&cfg, routes);

        let (mut client, server) = duplex(4096);
        client
            .write_all(b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello")
            .await
            .unwrap();
        serve_connection(server, peer(), &state).await.unwrap();

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        assert!(out.ends_with("\r\n\r\nhello"));
    }

    #[tokio::test]
    async fn test_truncated_request_gets_no_response() {
        let (mut client, server) = duplex(1024);
        client.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();
        client.shutdown().await.unwrap();

        let err = serve_connection(server, peer(), &test_state())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);

        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        assert!(out.is_empty());
    }
}
