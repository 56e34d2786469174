//! Route table
//!
//! Exact-match lookup from request path to handler, built once at startup and
//! shared read-only between connection tasks.

use std::collections::HashMap;

use super::builtin;

/// A route handler: request body in, complete response out
pub type Handler = fn(&str) -> String;

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: HashMap<String, Handler>,
    fallback: Handler,
}

impl RouteTable {
    /// Empty table answering every path with `fallback`
    pub fn new(fallback: Handler) -> Self {
        Self {
            routes: HashMap::new(),
            fallback,
        }
    }

    /// The fixed table served by this binary
    pub fn builtin() -> Self {
        Self::new(builtin::not_found)
            .route("/", builtin::root)
            .route("/about", builtin::about)
            .route("/api/data", builtin::api_data)
    }

    /// Register `handler` for `path`, replacing any earlier entry
    #[must_use]
    pub fn route(mut self, path: impl Into<String>, handler: Handler) -> Self {
        self.routes.insert(path.into(), handler);
        self
    }

    /// Handler registered for exactly `path`
    pub fn get(&self, path: &str) -> Option<Handler> {
        self.routes.get(path).copied()
    }

    /// Handler registered for `path`, or the fallback
    pub fn resolve(&self, path: &str) -> Handler {
        self.get(path).unwrap_or(self.fallback)
    }

    /// Dispatch a body to the handler for `path`
    pub fn dispatch(&self, path: &str, body: &str) -> String {
        (self.resolve(path))(body)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered paths in sorted order
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}
