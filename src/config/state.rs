// Application state module
// Everything connection tasks share; read-only once built

use super::types::{Config, LoggingConfig};
use crate::handler::RouteTable;

/// Application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub routes: RouteTable,
    pub logging: LoggingConfig,
}

impl AppState {
    /// State serving the built-in route table
    pub fn new(config: &Config) -> Self {
        Self::with_routes(config, RouteTable::builtin())
    }

    pub fn with_routes(config: &Config, routes: RouteTable) -> Self {
        Self {
            routes,
            logging: config.logging.clone(),
        }
    }
}
