//! Built-in route handlers
//!
//! The about, data and not-found handlers declare a literal `Content-Length`
//! that does not match their body; clients relying on it see a truncated or
//! short body. Kept as-is for wire compatibility.

use crate::http::response::{APPLICATION_JSON, TEXT_PLAIN};
use crate::http::{build_response, build_response_with_length};

pub const ROOT_BODY: &str = "Hello world this is my first Api with Boost.Asio ";
pub const ABOUT_BODY: &str = "This is the about page.";
pub const DATA_BODY: &str = r#"{"message": "Data"}"#;
pub const NOT_FOUND_BODY: &str = "Not Found\r\n";

const ABOUT_DECLARED_LENGTH: usize = 17;
const DATA_DECLARED_LENGTH: usize = 21;
const NOT_FOUND_DECLARED_LENGTH: usize = 13;

/// `/`
pub fn root(_body: &str) -> String {
    build_response(200, TEXT_PLAIN, ROOT_BODY)
}

/// `/about`
pub fn about(_body: &str) -> String {
    build_response_with_length(200, TEXT_PLAIN, ABOUT_DECLARED_LENGTH, ABOUT_BODY)
}

/// `/api/data`
pub fn api_data(_body: &str) -> String {
    build_response_with_length(200, APPLICATION_JSON, DATA_DECLARED_LENGTH, DATA_BODY)
}

/// Fallback for every unregistered path
pub fn not_found(_body: &str) -> String {
    build_response_with_length(404, TEXT_PLAIN, NOT_FOUND_DECLARED_LENGTH, NOT_FOUND_BODY)
}
