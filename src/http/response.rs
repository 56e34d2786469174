//! HTTP response building module
//!
//! Responses are plain strings written to the socket in one piece: status
//! line, `Content-Type`, `Content-Length`, blank line, body.

pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";

/// Reason phrase for the status codes this server emits
pub const fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Unknown",
    }
}

/// Build a response whose `Content-Length` is the body's byte length
pub fn build_response(status: u16, content_type: &str, body: &str) -> String {
    build_response_with_length(status, content_type, body.len(), body)
}

/// Build a response declaring `content_length` regardless of the body
pub fn build_response_with_length(
    status: u16,
    content_type: &str,
    content_length: usize,
    body: &str,
) -> String {
    format!(
        "HTTP/1.1 {status} {}\r\nContent-Type: {content_type}\r\nContent-Length: {content_length}\r\n\r\n{body}",
        reason_phrase(status)
    )
}

/// Status code from the status line of a built response
pub fn status_code(response: &str) -> Option<u16> {
    response.split_whitespace().nth(1)?.parse().ok()
}

/// Body bytes actually carried by a built response
pub fn body_len(response: &str) -> usize {
    response
        .find("\r\n\r\n")
        .map_or(0, |idx| response.len() - idx - 4)
}
