//! Application state for the web layer.

use std::sync::Arc;

use crate::config::ConfigSource;
use crate::summary::Aggregator;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Providers and their caches
    pub aggregator: Arc<Aggregator>,

    /// Configuration, re-read on every summary request
    pub config: ConfigSource,
}

impl AppState {
    pub fn new(aggregator: Aggregator, config: ConfigSource) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            config,
        }
    }
}
