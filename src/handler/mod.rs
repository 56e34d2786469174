//! Request handler module
//!
//! The route table and the fixed handlers it dispatches to.

pub mod builtin;
pub mod router;

pub use router::RouteTable;
