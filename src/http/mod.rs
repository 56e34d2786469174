//! HTTP protocol layer module
//!
//! Hand-rolled request splitting and response building over raw strings.

pub mod request;
pub mod response;

pub use request::{find_header_end, Request};
pub use response::{build_response, build_response_with_length};
