//! Route definitions for the HTTP server.

use axum::{routing::get, Router};

use super::{handlers, state::ServerState};

/// Path of the utilization endpoint.
pub const UTILIZATION_ROUTE: &str = "/:subscription_id/ComputeUtilization/:location/:vm_type";

/// Creates the router serving the utilization endpoint.
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route(UTILIZATION_ROUTE, get(handlers::compute_utilization_handler))
        .with_state(state)
}
