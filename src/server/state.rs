//! Server state management.

use crate::processing::UtilizationAggregator;
use std::sync::Arc;

/// Shared state of the HTTP server.
///
/// One aggregator, and with it one SKU cache, serves every request.
#[derive(Clone)]
pub struct ServerState {
    aggregator: Arc<UtilizationAggregator>,
}

impl ServerState {
    pub fn new(aggregator: Arc<UtilizationAggregator>) -> ServerState {
        ServerState { aggregator }
    }

    pub fn aggregator(&self) -> &Arc<UtilizationAggregator> {
        &self.aggregator
    }
}
