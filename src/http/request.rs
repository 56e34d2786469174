//! Request head splitting
//!
//! Turns the raw bytes read from a connection into a [`Request`]. Nothing is
//! validated: a missing request-line field becomes an empty string and header
//! lines are only counted.

/// Marker that ends the header section
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// A single request, alive for one connection only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub http_version: String,
    /// Number of header lines skipped before the body
    pub header_count: usize,
    /// Whatever followed the empty header line in the read buffer
    pub body: String,
}

impl Request {
    /// Split a buffered request into request line, headers and body.
    ///
    /// The buffer is expected to contain the header terminator, but parsing
    /// never fails: without it every remaining line is treated as a header
    /// and the body is empty.
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let mut rest: &str = &text;

        let request_line = next_line(&mut rest).unwrap_or_default();
        let mut fields = request_line.split_whitespace();
        let method = fields.next().unwrap_or_default().to_string();
        let path = fields.next().unwrap_or_default().to_string();
        let http_version = fields.next().unwrap_or_default().to_string();

        let mut header_count = 0;
        while let Some(line) = next_line(&mut rest) {
            if line == "\r" {
                break;
            }
            header_count += 1;
        }

        Self {
            method,
            path,
            http_version,
            header_count,
            body: rest.to_string(),
        }
    }
}

/// Position just past the header terminator, if the buffer holds one
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
        .map(|pos| pos + HEADER_TERMINATOR.len())
}

/// Take the next `\n`-terminated line off `rest`; the `\r` stays on the line.
fn next_line<'a>(rest: &mut &'a str) -> Option<&'a str> {
    if rest.is_empty() {
        return None;
    }
    match rest.find('\n') {
        Some(idx) => {
            let line = &rest[..idx];
            *rest = &rest[idx + 1..];
            Some(line)
        }
        None => {
            let line = *rest;
            *rest = "";
            Some(line)
        }
    }
}
